use std::sync::{Mutex, MutexGuard};

/// Count of requests in flight. Never goes below zero.
///
/// Only the boundary transitions matter to callers: `begin` reports the
/// step from idle to busy and `finish` the step back to idle. The hook
/// passed in runs under the counter lock, so a hide for one idle period
/// can't land after the show that opens the next one.
#[derive(Debug, Default)]
pub struct PendingCounter {
  pending: Mutex<usize>,
}

impl PendingCounter {
  pub fn new() -> Self {
    Self::default()
  }

  // The count is a plain integer, a poisoned lock still holds a valid value
  fn lock(&self) -> MutexGuard<'_, usize> {
    self
      .pending
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Register a request. When it is the only one in flight, `on_busy`
  /// runs before any other request can finish, and true is returned.
  pub fn begin(&self, on_busy: impl FnOnce()) -> bool {
    let mut pending = self.lock();
    *pending += 1;
    let first = *pending == 1;
    if first {
      on_busy();
    }
    first
  }

  /// Unregister a request. When this brings the count back to zero,
  /// `on_idle` runs before any other request can begin, and true is
  /// returned. A finish with nothing pending stays at zero.
  pub fn finish(&self, on_idle: impl FnOnce()) -> bool {
    let mut pending = self.lock();
    let Some(remaining) = pending.checked_sub(1) else {
      return false;
    };
    *pending = remaining;
    let last = remaining == 0;
    if last {
      on_idle();
    }
    last
  }

  pub fn pending(&self) -> usize {
    *self.lock()
  }
}
