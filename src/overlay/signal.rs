use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// What the overlay is reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlayKind {
  #[default]
  Loading,
  Success,
  Error,
}

/// Current overlay contents as seen by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayState {
  pub visible: bool,
  pub message: String,
  pub kind: OverlayKind,
  /// Bumped by every show, so a scheduled auto-hide can tell whether it
  /// has been superseded.
  generation: u64,
}

/// One-slot overlay signal: the latest call wins, nothing is queued.
///
/// Cloning shares the same underlying state.
#[derive(Clone)]
pub struct OverlaySignal {
  tx: Arc<watch::Sender<OverlayState>>,
}

impl OverlaySignal {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(OverlayState::default());
    Self { tx: Arc::new(tx) }
  }

  /// Show `message` immediately, replacing whatever is displayed.
  pub fn show(&self, message: &str, kind: OverlayKind) {
    self.replace(message, kind);
  }

  /// Show `message`, then hide after `duration` unless another show has
  /// happened in between.
  ///
  /// Must be called from within a Tokio runtime.
  pub fn show_temporary(&self, message: &str, kind: OverlayKind, duration: Duration) {
    let generation = self.replace(message, kind);
    let tx = Arc::clone(&self.tx);

    tokio::spawn(async move {
      tokio::time::sleep(duration).await;
      tx.send_if_modified(|state| {
        if state.generation == generation && state.visible {
          state.visible = false;
          true
        } else {
          false
        }
      });
    });
  }

  pub fn show_error(&self, message: &str) {
    self.show(message, OverlayKind::Error);
  }

  pub fn hide(&self) {
    self.tx.send_if_modified(|state| {
      let changed = state.visible;
      state.visible = false;
      changed
    });
  }

  pub fn state(&self) -> OverlayState {
    self.tx.borrow().clone()
  }

  /// Receiver for renderers; it observes every state change.
  pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
    self.tx.subscribe()
  }

  fn replace(&self, message: &str, kind: OverlayKind) -> u64 {
    let mut generation = 0;
    self.tx.send_modify(|state| {
      state.generation += 1;
      state.visible = true;
      state.message = message.to_string();
      state.kind = kind;
      generation = state.generation;
    });
    generation
  }
}

impl Default for OverlaySignal {
  fn default() -> Self {
    Self::new()
  }
}
