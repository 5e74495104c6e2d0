//! Client-side location tracking.

use color_eyre::{eyre::eyre, Result};
use std::sync::Mutex;
use tracing::info;
use url::Url;

/// Navigation seam the HTTP wrapper uses to redirect after a rejected
/// admin session.
pub trait Navigator: Send + Sync {
  /// Current path, without query string or fragment.
  fn current_path(&self) -> String;

  /// Replace the current location.
  fn navigate(&self, location: &str);
}

/// Router holding the current location (path, query and fragment).
pub struct Router {
  location: Mutex<String>,
}

impl Router {
  pub fn new(location: &str) -> Self {
    Self {
      location: Mutex::new(location.to_string()),
    }
  }

  pub fn location(&self) -> String {
    self
      .location
      .lock()
      .map(|l| l.clone())
      .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
  }
}

impl Default for Router {
  fn default() -> Self {
    Self::new("/")
  }
}

impl Navigator for Router {
  fn current_path(&self) -> String {
    RouteInfo::parse(&self.location())
      .map(|route| route.path)
      .unwrap_or_else(|_| self.location())
  }

  fn navigate(&self, location: &str) {
    let mut current = self
      .location
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    info!(from = %current, to = location, "navigate");
    *current = location.to_string();
  }
}

/// A location split into its parts, as shown on the route test page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
  pub path: String,
  /// Raw query string including the leading `?`, empty when absent
  pub search: String,
  /// Fragment including the leading `#`, empty when absent
  pub hash: String,
  /// Value of the `token` query parameter
  pub token: Option<String>,
}

impl RouteInfo {
  /// Parse a client location such as `/admin/reset?token=abc#top`.
  pub fn parse(location: &str) -> Result<Self> {
    let base = Url::parse("http://localhost/").map_err(|e| eyre!("Invalid base URL: {}", e))?;
    let url = base
      .join(location)
      .map_err(|e| eyre!("Invalid location '{}': {}", location, e))?;

    let token = url
      .query_pairs()
      .find(|(name, _)| name == "token")
      .map(|(_, value)| value.into_owned());

    Ok(Self {
      path: url.path().to_string(),
      search: url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
      hash: url.fragment().map(|f| format!("#{}", f)).unwrap_or_default(),
      token,
    })
  }
}
