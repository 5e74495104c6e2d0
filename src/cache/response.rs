//! TTL-bounded response store.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Expiry used when `now + ttl` can't be represented.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// A cached payload and the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry {
  data: Value,
  expires_at: Instant,
}

/// Snapshot of the cache contents for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
  pub size: usize,
  pub keys: Vec<String>,
}

/// Shared response cache.
///
/// There is no size bound and no LRU: entries leave only when a read
/// finds them expired or when they are cleared explicitly.
pub struct ResponseCache {
  entries: Mutex<HashMap<String, CacheEntry>>,
  default_ttl: Duration,
}

impl ResponseCache {
  pub fn new() -> Self {
    Self::with_default_ttl(Duration::from_secs(5 * 60))
  }

  pub fn with_default_ttl(default_ttl: Duration) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      default_ttl,
    }
  }

  pub fn default_ttl(&self) -> Duration {
    self.default_ttl
  }

  // A panic while holding the lock can't leave a half-written entry, so
  // a poisoned map is still consistent.
  fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    self
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Store `data` under `key`, replacing any existing entry.
  ///
  /// A TTL too large for the clock is capped at `MAX_TTL`.
  pub fn set(&self, key: &str, data: Value, ttl: Duration) {
    let now = Instant::now();
    let expires_at = now
      .checked_add(ttl)
      .unwrap_or_else(|| now + MAX_TTL);
    let entry = CacheEntry { data, expires_at };
    self.lock().insert(key.to_string(), entry);
    debug!(key, ttl_ms = ttl.as_millis() as u64, "cache set");
  }

  /// Look up a live entry. An expired entry is removed and reported as a miss.
  pub fn get(&self, key: &str) -> Option<Value> {
    let mut entries = self.lock();
    let entry = entries.get(key)?;

    if Instant::now() < entry.expires_at {
      return Some(entry.data.clone());
    }

    entries.remove(key);
    debug!(key, "cache entry expired");
    None
  }

  pub fn clear(&self, key: &str) {
    self.lock().remove(key);
  }

  pub fn clear_all(&self) {
    self.lock().clear();
  }

  /// Remove every entry whose key contains `pattern`.
  ///
  /// This is a plain substring test: `/contact` also matches
  /// `/contact-messages_{}`.
  pub fn clear_by_pattern(&self, pattern: &str) -> usize {
    let mut entries = self.lock();
    let before = entries.len();
    entries.retain(|key, _| !key.contains(pattern));
    let removed = before - entries.len();
    debug!(pattern, removed, "cache invalidated by pattern");
    removed
  }

  pub fn stats(&self) -> CacheStats {
    let entries = self.lock();
    let mut keys: Vec<String> = entries.keys().cloned().collect();
    keys.sort();
    CacheStats {
      size: entries.len(),
      keys,
    }
  }
}

impl Default for ResponseCache {
  fn default() -> Self {
    Self::new()
  }
}
