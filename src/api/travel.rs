//! Typed facade over the travel agency endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

use super::client::ApiClient;
use super::error::ApiError;
use super::options::RequestOptions;
use super::types::{ContactInfo, ContactMessage, EmailStatus, EmailToggle, MessageResponse};

const CONTACT: &str = "/contact";
const CONTACT_MESSAGES: &str = "/contact-messages";
const EMAIL_SETTINGS: &str = "/admin/email-settings";
const EMAIL_STATUS: &str = "/admin/email-settings/status";
const EMAIL_TOGGLE: &str = "/admin/email-settings/toggle";
const EMAIL_TEST: &str = "/admin/email-settings/test";

/// Travel agency API.
///
/// This wraps the underlying ApiClient, so every call gets the loading
/// overlay, auth header and caching behavior.
#[derive(Clone)]
pub struct TravelApi {
  client: ApiClient,
}

impl TravelApi {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  /// Agency contact details (cached).
  pub async fn contact_info(&self) -> Result<ContactInfo, ApiError> {
    let options = RequestOptions::new().loading("Loading contact information...");
    self.client.get(CONTACT, &options).await?.json()
  }

  /// Submit the contact form. Feedback is left to the caller.
  pub async fn send_contact_message(&self, message: &ContactMessage) -> Result<(), ApiError> {
    let options = RequestOptions::new()
      .loading("Sending message...")
      .invalidate(CONTACT_MESSAGES)
      .quiet();
    self
      .client
      .post(CONTACT_MESSAGES, to_body(message)?, &options)
      .await?;
    Ok(())
  }

  /// Whether outgoing notification emails are enabled. Never cached.
  pub async fn email_status(&self) -> Result<EmailStatus, ApiError> {
    let options = RequestOptions::new()
      .loading("Checking email settings...")
      .skip_cache();
    self.client.get(EMAIL_STATUS, &options).await?.json()
  }

  pub async fn set_email_enabled(&self, enabled: bool) -> Result<MessageResponse, ApiError> {
    let options = RequestOptions::new()
      .loading("Updating email settings...")
      .invalidate(EMAIL_SETTINGS)
      .success(if enabled {
        "Email notifications enabled"
      } else {
        "Email notifications disabled"
      });
    self
      .client
      .post(EMAIL_TOGGLE, to_body(&EmailToggle { enabled })?, &options)
      .await?
      .json()
  }

  /// Ask the backend to send a test email.
  pub async fn test_email(&self) -> Result<MessageResponse, ApiError> {
    let options = RequestOptions::new()
      .loading("Sending test email...")
      .success("Test email sent");
    self
      .client
      .post(EMAIL_TEST, Value::Object(Default::default()), &options)
      .await?
      .json()
  }

  pub fn cache_stats(&self) -> CacheStats {
    self.client.cache_stats()
  }

  pub fn clear_cache(&self, pattern: Option<&str>) {
    self.client.clear_cache(pattern)
  }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
  serde_json::to_value(value).map_err(|e| ApiError::request(format!("Failed to encode request: {}", e)))
}
