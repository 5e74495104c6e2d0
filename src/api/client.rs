//! HTTP client wrapper shared by every backend call.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{generate_key, CacheStats, ResponseCache};
use crate::config::Config;
use crate::overlay::{OverlayKind, OverlaySignal};
use crate::session::{
  Navigator, SessionStore, ADMIN_LOGIN_ROUTE, ADMIN_ROUTE_PREFIX, ADMIN_TOKEN_KEY, ADMIN_USER_KEY,
};

use super::error::ApiError;
use super::options::{RequestOptions, Verb};
use super::pending::PendingCounter;

/// How long a success message stays on screen.
const SUCCESS_FLASH: Duration = Duration::from_secs(2);

/// Where a response body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  Network,
  Cache,
}

/// Successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
  pub data: Value,
  pub status: u16,
  pub source: ResponseSource,
}

impl ApiResponse {
  fn cached(data: Value) -> Self {
    Self {
      data,
      status: 200,
      source: ResponseSource::Cache,
    }
  }

  /// Decode the body into a typed value.
  pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
    serde_json::from_value(self.data.clone())
      .map_err(|e| ApiError::request(format!("Unexpected response format: {}", e)))
  }
}

/// Client wrapper: auth header, loading overlay, response caching and
/// failure classification for every call.
///
/// Clones share the cache, the pending counter and the overlay.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  cache: Arc<ResponseCache>,
  pending: Arc<PendingCounter>,
  overlay: OverlaySignal,
  session: Arc<dyn SessionStore>,
  navigator: Arc<dyn Navigator>,
}

impl ApiClient {
  pub fn new(
    base_url: &str,
    timeout: Duration,
    cache: Arc<ResponseCache>,
    overlay: OverlaySignal,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
  ) -> color_eyre::Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      cache,
      pending: Arc::new(PendingCounter::new()),
      overlay,
      session,
      navigator,
    })
  }

  pub fn from_config(
    config: &Config,
    overlay: OverlaySignal,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
  ) -> color_eyre::Result<Self> {
    let cache = Arc::new(ResponseCache::with_default_ttl(config.default_cache_ttl()));
    Self::new(
      &config.api_base_url(),
      config.request_timeout(),
      cache,
      overlay,
      session,
      navigator,
    )
  }

  pub fn overlay(&self) -> &OverlaySignal {
    &self.overlay
  }

  pub fn pending(&self) -> usize {
    self.pending.pending()
  }

  pub async fn get(&self, path: &str, options: &RequestOptions) -> Result<ApiResponse, ApiError> {
    self.execute(Verb::Get, path, None, options).await
  }

  pub async fn post(
    &self,
    path: &str,
    body: Value,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    self.execute(Verb::Post, path, Some(body), options).await
  }

  pub async fn put(
    &self,
    path: &str,
    body: Value,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    self.execute(Verb::Put, path, Some(body), options).await
  }

  pub async fn patch(
    &self,
    path: &str,
    body: Value,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    self.execute(Verb::Patch, path, Some(body), options).await
  }

  pub async fn delete(
    &self,
    path: &str,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    self.execute(Verb::Delete, path, None, options).await
  }

  /// Clear entries containing `pattern`, or everything when no pattern
  /// is given.
  pub fn clear_cache(&self, pattern: Option<&str>) {
    match pattern {
      Some(pattern) => {
        self.cache.clear_by_pattern(pattern);
      }
      None => self.cache.clear_all(),
    }
  }

  pub fn cache_stats(&self) -> CacheStats {
    self.cache.stats()
  }

  async fn execute(
    &self,
    verb: Verb,
    path: &str,
    body: Option<Value>,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    self.pending.begin(|| {
      self
        .overlay
        .show(options.resolved_loading_message(verb), OverlayKind::Loading)
    });

    let result = self.perform(verb, path, body, options).await;

    // Hide first so the outcome below isn't wiped by the loading overlay
    self.pending.finish(|| self.overlay.hide());

    match &result {
      Ok(_) => {
        if let Some(message) = options.resolved_success_message(verb) {
          self
            .overlay
            .show_temporary(message, OverlayKind::Success, SUCCESS_FLASH);
        }
      }
      Err(err) => self.report_failure(verb, path, err),
    }

    result
  }

  async fn perform(
    &self,
    verb: Verb,
    path: &str,
    body: Option<Value>,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    let cache_key = (verb == Verb::Get && !options.skip_cache).then(|| {
      generate_key(
        path,
        options.params.iter().map(|(name, value)| (name.as_str(), value)),
      )
    });

    if let Some(key) = &cache_key {
      if let Some(data) = self.cache.get(key) {
        debug!(key = %key, "serving from cache");
        return Ok(ApiResponse::cached(data));
      }
    }

    let response = self.send(verb, path, body, options).await?;

    if let Some(key) = cache_key {
      let ttl = options.cache_ttl.unwrap_or_else(|| self.cache.default_ttl());
      self.cache.set(&key, response.data.clone(), ttl);
    }

    if verb != Verb::Get {
      if let Some(pattern) = &options.invalidate_cache {
        self.cache.clear_by_pattern(pattern);
      }
    }

    Ok(response)
  }

  async fn send(
    &self,
    verb: Verb,
    path: &str,
    body: Option<Value>,
    options: &RequestOptions,
  ) -> Result<ApiResponse, ApiError> {
    let url = self.url_for(path)?;
    let mut request = self.http.request(verb.method(), url);

    let query = options.query_pairs();
    if !query.is_empty() {
      request = request.query(&query);
    }

    let token = self
      .session
      .get(ADMIN_TOKEN_KEY)
      .map_err(|e| ApiError::request(format!("Failed to read session: {}", e)))?;
    if let Some(token) = token.filter(|t| !t.is_empty()) {
      request = request.bearer_auth(token);
    }

    if let Some(body) = &body {
      request = request.json(body);
    }

    debug!(method = %verb.method(), path, "sending request");
    let response = request.send().await.map_err(ApiError::from_transport)?;
    let status = response.status();
    let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
    let data = decode_body(&bytes);

    if status.is_success() {
      Ok(ApiResponse {
        data,
        status: status.as_u16(),
        source: ResponseSource::Network,
      })
    } else {
      Err(ApiError::from_status(status.as_u16(), data))
    }
  }

  fn url_for(&self, path: &str) -> Result<Url, ApiError> {
    let raw = if path.starts_with('/') {
      format!("{}{}", self.base_url, path)
    } else {
      format!("{}/{}", self.base_url, path)
    };
    Url::parse(&raw).map_err(|e| ApiError::request(format!("Invalid request URL '{}': {}", raw, e)))
  }

  fn report_failure(&self, verb: Verb, path: &str, err: &ApiError) {
    warn!(method = %verb.method(), path, status = ?err.status(), error = %err, "request failed");

    if err.is_unauthorized() && self.navigator.current_path().starts_with(ADMIN_ROUTE_PREFIX) {
      self.end_admin_session();
    }

    self.overlay.show_error(err.user_message());
  }

  fn end_admin_session(&self) {
    for key in [ADMIN_TOKEN_KEY, ADMIN_USER_KEY] {
      if let Err(e) = self.session.remove(key) {
        warn!(key, error = %e, "failed to clear session value");
      }
    }
    info!("admin session rejected, redirecting to login");
    self.navigator.navigate(ADMIN_LOGIN_ROUTE);
  }
}

/// JSON bodies decode as-is; anything else is kept as text.
fn decode_body(bytes: &[u8]) -> Value {
  if bytes.is_empty() {
    return Value::Null;
  }
  serde_json::from_slice(bytes)
    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::{MemorySessionStore, Router};
  use mockito::{Matcher, Server};
  use serde_json::json;

  struct Harness {
    client: ApiClient,
    session: Arc<MemorySessionStore>,
    router: Arc<Router>,
  }

  fn harness(base_url: &str, location: &str) -> Harness {
    harness_with_timeout(base_url, location, Duration::from_secs(10))
  }

  fn harness_with_timeout(base_url: &str, location: &str, timeout: Duration) -> Harness {
    let session = Arc::new(MemorySessionStore::new());
    let router = Arc::new(Router::new(location));
    let client = ApiClient::new(
      base_url,
      timeout,
      Arc::new(ResponseCache::new()),
      OverlaySignal::new(),
      session.clone(),
      router.clone(),
    )
    .unwrap();
    Harness {
      client,
      session,
      router,
    }
  }

  fn contact_body() -> String {
    json!({
      "phoneOffice": "020-2345-6789",
      "emailPrimary": "info@example.com"
    })
    .to_string()
  }

  #[test]
  fn test_decode_body() {
    assert_eq!(decode_body(b""), Value::Null);
    assert_eq!(decode_body(br#"{"message":"ok"}"#), json!({"message": "ok"}));
    assert_eq!(decode_body(b"Bad Gateway"), json!("Bad Gateway"));
  }

  #[tokio::test]
  async fn test_get_is_cached_within_ttl() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/contact")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(contact_body())
      .expect(1)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    let options = RequestOptions::new();

    let first = h.client.get("/contact", &options).await.unwrap();
    let second = h.client.get("/contact", &options).await.unwrap();

    assert_eq!(first.source, ResponseSource::Network);
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(first.data, second.data);
    assert_eq!(h.client.cache_stats().keys, vec!["/contact_{}".to_string()]);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_param_order_shares_cache_entry() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/tours")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("city".into(), "Pune".into()),
        Matcher::UrlEncoded("page".into(), "2".into()),
      ]))
      .with_status(200)
      .with_body("[]")
      .expect(1)
      .create_async()
      .await;

    let h = harness(&server.url(), "/");
    let a = RequestOptions::new().param("city", "Pune").param("page", 2);
    let b = RequestOptions::new().param("page", 2).param("city", "Pune");

    h.client.get("/tours", &a).await.unwrap();
    let second = h.client.get("/tours", &b).await.unwrap();

    assert_eq!(second.source, ResponseSource::Cache);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_skip_cache_always_hits_network() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/admin/email-settings/status")
      .with_status(200)
      .with_body(r#"{"emailEnabled":true}"#)
      .expect(2)
      .create_async()
      .await;

    let h = harness(&server.url(), "/admin");
    let options = RequestOptions::new().skip_cache();

    h.client.get("/admin/email-settings/status", &options).await.unwrap();
    h.client.get("/admin/email-settings/status", &options).await.unwrap();

    assert_eq!(h.client.cache_stats().size, 0);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_error_responses_are_not_cached() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/contact")
      .with_status(500)
      .expect(2)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    assert!(h.client.get("/contact", &RequestOptions::new()).await.is_err());
    assert!(h.client.get("/contact", &RequestOptions::new()).await.is_err());

    assert_eq!(h.client.cache_stats().size, 0);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_post_invalidates_matching_entries() {
    let mut server = Server::new_async().await;
    let get_mock = server
      .mock("GET", "/contact")
      .with_status(200)
      .with_body(contact_body())
      .expect(2)
      .create_async()
      .await;
    let post_mock = server
      .mock("POST", "/contact-messages")
      .match_body(Matcher::PartialJson(json!({"name": "Asha"})))
      .with_status(201)
      .with_body(r#"{"message":"Message received"}"#)
      .expect(1)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");

    h.client.get("/contact", &RequestOptions::new()).await.unwrap();
    let posted = h
      .client
      .post(
        "/contact-messages",
        json!({"name": "Asha", "message": "Hello"}),
        &RequestOptions::new().invalidate("/contact"),
      )
      .await
      .unwrap();
    assert_eq!(posted.status, 201);
    assert_eq!(h.client.cache_stats().size, 0);

    let refetched = h.client.get("/contact", &RequestOptions::new()).await.unwrap();
    assert_eq!(refetched.source, ResponseSource::Network);

    get_mock.assert_async().await;
    post_mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_failed_post_does_not_invalidate() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/contact")
      .with_status(200)
      .with_body(contact_body())
      .create_async()
      .await;
    server
      .mock("POST", "/contact-messages")
      .with_status(400)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    h.client.get("/contact", &RequestOptions::new()).await.unwrap();

    let err = h
      .client
      .post("/contact-messages", json!({}), &RequestOptions::new().invalidate("/contact"))
      .await
      .unwrap_err();

    assert_eq!(err.user_message(), "Invalid request. Please check your input.");
    assert_eq!(h.client.cache_stats().size, 1);
  }

  #[tokio::test]
  async fn test_bearer_token_attached_when_stored() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("POST", "/admin/email-settings/test")
      .match_header("authorization", "Bearer secret-token")
      .with_status(200)
      .with_body(r#"{"message":"Test email sent"}"#)
      .create_async()
      .await;

    let h = harness(&server.url(), "/admin/settings");
    h.session.set(ADMIN_TOKEN_KEY, "secret-token").unwrap();

    h.client
      .post("/admin/email-settings/test", json!({}), &RequestOptions::new())
      .await
      .unwrap();

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_no_authorization_header_without_token() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/contact")
      .match_header("authorization", Matcher::Missing)
      .with_status(200)
      .with_body(contact_body())
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    h.client.get("/contact", &RequestOptions::new()).await.unwrap();

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_unauthorized_on_admin_route_ends_session() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/admin/email-settings/status")
      .with_status(401)
      .with_body(r#"{"message":"Token expired"}"#)
      .create_async()
      .await;

    let h = harness(&server.url(), "/admin/dashboard");
    h.session.set(ADMIN_TOKEN_KEY, "stale").unwrap();
    h.session.set(ADMIN_USER_KEY, r#"{"username":"admin"}"#).unwrap();

    let err = h
      .client
      .get("/admin/email-settings/status", &RequestOptions::new())
      .await
      .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.session.get(ADMIN_TOKEN_KEY).unwrap(), None);
    assert_eq!(h.session.get(ADMIN_USER_KEY).unwrap(), None);
    assert_eq!(h.router.location(), ADMIN_LOGIN_ROUTE);

    let overlay = h.client.overlay().state();
    assert!(overlay.visible);
    assert_eq!(overlay.kind, OverlayKind::Error);
    assert_eq!(overlay.message, "Unauthorized. Please login again.");
  }

  #[tokio::test]
  async fn test_unauthorized_on_public_route_keeps_session() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/contact")
      .with_status(401)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    h.session.set(ADMIN_TOKEN_KEY, "still-valid").unwrap();

    let err = h.client.get("/contact", &RequestOptions::new()).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.session.get(ADMIN_TOKEN_KEY).unwrap().as_deref(), Some("still-valid"));
    assert_eq!(h.router.location(), "/contact");
  }

  #[tokio::test]
  async fn test_unknown_status_reports_server_message() {
    let mut server = Server::new_async().await;
    server
      .mock("PUT", "/bookings/7")
      .with_status(409)
      .with_body(r#"{"message":"Booking already confirmed"}"#)
      .create_async()
      .await;

    let h = harness(&server.url(), "/");
    let err = h
      .client
      .put("/bookings/7", json!({"status": "confirmed"}), &RequestOptions::new())
      .await
      .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.user_message(), "Error 409: Booking already confirmed");
    assert_eq!(h.client.overlay().state().message, "Error 409: Booking already confirmed");
  }

  #[tokio::test]
  async fn test_success_flash_follows_hidden_loading() {
    let mut server = Server::new_async().await;
    server
      .mock("DELETE", "/bookings/7")
      .with_status(204)
      .create_async()
      .await;

    let h = harness(&server.url(), "/");
    let response = h
      .client
      .delete("/bookings/7", &RequestOptions::new())
      .await
      .unwrap();

    assert_eq!(response.data, Value::Null);
    assert_eq!(h.client.pending(), 0);
    let overlay = h.client.overlay().state();
    assert!(overlay.visible);
    assert_eq!(overlay.kind, OverlayKind::Success);
    assert_eq!(overlay.message, "Data deleted successfully!");
  }

  #[tokio::test]
  async fn test_get_leaves_overlay_hidden() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/contact")
      .with_status(200)
      .with_body(contact_body())
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    h.client
      .get("/contact", &RequestOptions::new().loading("Loading contact information..."))
      .await
      .unwrap();

    let overlay = h.client.overlay().state();
    assert!(!overlay.visible);
    assert_eq!(overlay.kind, OverlayKind::Loading);
    assert_eq!(overlay.message, "Loading contact information...");
  }

  #[tokio::test]
  async fn test_concurrent_gets_are_not_deduplicated() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/contact")
      .with_status(200)
      .with_body(contact_body())
      .expect(2)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");
    let options = RequestOptions::new();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut rx = h.client.overlay().subscribe();
    let recorder = {
      let seen = seen.clone();
      tokio::spawn(async move {
        while rx.changed().await.is_ok() {
          let visible = rx.borrow_and_update().visible;
          seen.lock().unwrap().push(visible);
        }
      })
    };

    let (a, b) = futures::join!(
      h.client.get("/contact", &options),
      h.client.get("/contact", &options)
    );

    assert_eq!(a.unwrap().data, b.unwrap().data);
    assert_eq!(h.client.pending(), 0);
    assert!(!h.client.overlay().state().visible);
    assert_eq!(h.client.cache_stats().size, 1);
    mock.assert_async().await;

    tokio::time::timeout(Duration::from_secs(1), async {
      while seen.lock().unwrap().len() < 2 {
        tokio::task::yield_now().await;
      }
    })
    .await
    .unwrap();
    recorder.abort();

    // One show for the first request, one hide after the last
    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_overlapping_requests_across_threads_end_hidden() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/contact")
      .with_status(200)
      .with_body(contact_body())
      .expect(16)
      .create_async()
      .await;

    let h = harness(&server.url(), "/contact");

    for _ in 0..4 {
      let tasks: Vec<_> = (0..4)
        .map(|_| {
          let client = h.client.clone();
          tokio::spawn(async move {
            client
              .get("/contact", &RequestOptions::new().skip_cache())
              .await
          })
        })
        .collect();

      for task in tasks {
        task.await.unwrap().unwrap();
      }

      assert_eq!(h.client.pending(), 0);
      assert!(!h.client.overlay().state().visible);
    }

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_timeout_is_a_network_error() {
    // Accepts connections at the OS level but never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let h = harness_with_timeout(&base_url, "/contact", Duration::from_millis(200));
    let err = h.client.get("/contact", &RequestOptions::new()).await.unwrap_err();

    assert!(err.is_network());
    assert_eq!(err.status(), None);
    assert_eq!(err.user_message(), "Network error. Please check your connection.");
    assert_eq!(h.client.pending(), 0);
    assert_eq!(h.client.overlay().state().kind, OverlayKind::Error);
    drop(listener);
  }

  #[tokio::test]
  async fn test_connection_refused_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let h = harness(&base_url, "/contact");
    let err = h.client.get("/contact", &RequestOptions::new()).await.unwrap_err();

    assert!(err.is_network());
  }

  #[tokio::test]
  async fn test_unbuildable_request_reports_own_message() {
    let h = harness("not a url", "/contact");
    let err = h.client.get("/contact", &RequestOptions::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Request { .. }));
    assert!(err.user_message().starts_with("Invalid request URL 'not a url/contact'"));
    assert_eq!(h.client.pending(), 0);

    let overlay = h.client.overlay().state();
    assert_eq!(overlay.kind, OverlayKind::Error);
    assert_eq!(overlay.message, err.user_message());
  }

  #[tokio::test]
  async fn test_clear_cache_by_pattern_and_all() {
    let h = harness("http://localhost", "/");
    h.client.cache.set("/contact_{}", json!(1), Duration::from_secs(60));
    h.client.cache.set("/tours_{}", json!(2), Duration::from_secs(60));

    h.client.clear_cache(Some("/contact"));
    assert_eq!(h.client.cache_stats().keys, vec!["/tours_{}".to_string()]);

    h.client.clear_cache(None);
    assert_eq!(h.client.cache_stats().size, 0);
  }
}
