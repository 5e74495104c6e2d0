use serde_json::Value;
use std::time::Duration;

/// HTTP verb, with the messages the overlay uses for it by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
  Get,
  Post,
  Put,
  Patch,
  Delete,
}

impl Verb {
  pub fn method(self) -> reqwest::Method {
    match self {
      Verb::Get => reqwest::Method::GET,
      Verb::Post => reqwest::Method::POST,
      Verb::Put => reqwest::Method::PUT,
      Verb::Patch => reqwest::Method::PATCH,
      Verb::Delete => reqwest::Method::DELETE,
    }
  }

  pub fn loading_message(self) -> &'static str {
    match self {
      Verb::Get => "Loading data...",
      Verb::Post => "Saving data...",
      Verb::Put | Verb::Patch => "Updating data...",
      Verb::Delete => "Deleting data...",
    }
  }

  pub fn success_message(self) -> &'static str {
    match self {
      Verb::Get => "Operation completed successfully!",
      Verb::Post => "Data saved successfully!",
      Verb::Put | Verb::Patch => "Data updated successfully!",
      Verb::Delete => "Data deleted successfully!",
    }
  }

  /// Mutating verbs flash a success message unless told otherwise.
  pub fn shows_success_by_default(self) -> bool {
    self != Verb::Get
  }
}

/// Per-call options. Everything is optional; unset fields fall back to
/// the verb defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  /// Query parameters in the order given
  pub params: Vec<(String, Value)>,
  /// GET only: neither read nor populate the cache
  pub skip_cache: bool,
  /// GET only: lifetime of the cached response
  pub cache_ttl: Option<Duration>,
  /// Mutating verbs: substring of cache keys to purge on success
  pub invalidate_cache: Option<String>,
  pub loading_message: Option<String>,
  pub show_success_message: Option<bool>,
  pub success_message: Option<String>,
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.params.push((name.into(), value.into()));
    self
  }

  pub fn skip_cache(mut self) -> Self {
    self.skip_cache = true;
    self
  }

  pub fn cache_ttl(mut self, ttl: Duration) -> Self {
    self.cache_ttl = Some(ttl);
    self
  }

  pub fn invalidate(mut self, pattern: impl Into<String>) -> Self {
    self.invalidate_cache = Some(pattern.into());
    self
  }

  pub fn loading(mut self, message: impl Into<String>) -> Self {
    self.loading_message = Some(message.into());
    self
  }

  pub fn success(mut self, message: impl Into<String>) -> Self {
    self.show_success_message = Some(true);
    self.success_message = Some(message.into());
    self
  }

  pub fn quiet(mut self) -> Self {
    self.show_success_message = Some(false);
    self
  }

  pub(crate) fn resolved_loading_message(&self, verb: Verb) -> &str {
    self
      .loading_message
      .as_deref()
      .unwrap_or_else(|| verb.loading_message())
  }

  /// Success text to flash, or None when this call stays quiet.
  pub(crate) fn resolved_success_message(&self, verb: Verb) -> Option<&str> {
    let show = self
      .show_success_message
      .unwrap_or_else(|| verb.shows_success_by_default());
    if !show {
      return None;
    }
    Some(
      self
        .success_message
        .as_deref()
        .unwrap_or_else(|| verb.success_message()),
    )
  }

  /// Query parameters rendered for the URL; strings go in unquoted.
  pub(crate) fn query_pairs(&self) -> Vec<(String, String)> {
    self
      .params
      .iter()
      .map(|(name, value)| {
        let value = match value {
          Value::String(s) => s.clone(),
          other => other.to_string(),
        };
        (name.clone(), value)
      })
      .collect()
  }
}
