//! Backend payloads.

use serde::{Deserialize, Serialize};

/// Agency contact details served by `GET /contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
  pub phone_office: Option<String>,
  pub phone_mobile: Option<String>,
  pub phone_whatsapp: Option<String>,
  pub email_primary: Option<String>,
  pub email_bookings: Option<String>,
  pub email_support: Option<String>,
  pub business_hours_weekdays: Option<String>,
  pub business_hours_sunday: Option<String>,
  pub address_line1: Option<String>,
  pub address_line2: Option<String>,
  pub address_city: Option<String>,
  pub address_state: Option<String>,
  pub address_pincode: Option<String>,
  pub social_facebook: Option<String>,
  pub social_instagram: Option<String>,
  pub social_linkedin: Option<String>,
}

impl ContactInfo {
  /// Chat link for the WhatsApp number, digits only.
  pub fn whatsapp_link(&self) -> Option<String> {
    let digits: String = self
      .phone_whatsapp
      .as_deref()?
      .chars()
      .filter(char::is_ascii_digit)
      .collect();
    if digits.is_empty() {
      None
    } else {
      Some(format!("https://wa.me/{}", digits))
    }
  }

  /// One-line postal address, skipping missing parts.
  pub fn address(&self) -> Option<String> {
    let parts: Vec<&str> = [
      &self.address_line1,
      &self.address_line2,
      &self.address_city,
      &self.address_state,
      &self.address_pincode,
    ]
    .into_iter()
    .filter_map(|part| part.as_deref())
    .filter(|part| !part.trim().is_empty())
    .collect();

    if parts.is_empty() {
      None
    } else {
      Some(parts.join(", "))
    }
  }
}

/// Contact form submission for `POST /contact-messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub phone: String,
  pub message: String,
}

/// `GET /admin/email-settings/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailStatus {
  pub email_enabled: bool,
}

/// Body of `POST /admin/email-settings/toggle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailToggle {
  pub enabled: bool,
}

/// Admin endpoints answer with a human-readable `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
  #[serde(default)]
  pub message: String,
}
