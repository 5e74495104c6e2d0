use serde_json::Value;
use thiserror::Error;

const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred.";

/// Failure of a call through the request pipeline.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The server answered with a non-success status
  #[error("{message}")]
  Status {
    status: u16,
    message: String,
    body: Value,
  },

  /// The request went out but no response came back (connect failure,
  /// timeout, dropped connection)
  #[error("{message}")]
  Network {
    message: String,
    #[source]
    source: reqwest::Error,
  },

  /// The request could not be built or sent
  #[error("{message}")]
  Request { message: String },
}

impl ApiError {
  /// Classify a response status. `body` is the decoded response body.
  pub fn from_status(status: u16, body: Value) -> Self {
    let message = status_message(status, &body);
    ApiError::Status {
      status,
      message,
      body,
    }
  }

  /// Classify a transport failure reported by reqwest.
  pub fn from_transport(err: reqwest::Error) -> Self {
    if err.is_builder() {
      return ApiError::request(err.to_string());
    }
    ApiError::Network {
      message: NETWORK_MESSAGE.to_string(),
      source: err,
    }
  }

  /// A local failure; an empty description gets the generic fallback.
  pub fn request(message: impl Into<String>) -> Self {
    let message = message.into();
    let message = if message.trim().is_empty() {
      UNEXPECTED_MESSAGE.to_string()
    } else {
      message
    };
    ApiError::Request { message }
  }

  pub fn user_message(&self) -> &str {
    match self {
      ApiError::Status { message, .. }
      | ApiError::Network { message, .. }
      | ApiError::Request { message } => message,
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    self.status() == Some(401)
  }

  pub fn is_network(&self) -> bool {
    matches!(self, ApiError::Network { .. })
  }
}

fn status_message(status: u16, body: &Value) -> String {
  match status {
    400 => "Invalid request. Please check your input.".to_string(),
    401 => "Unauthorized. Please login again.".to_string(),
    403 => "Access denied. You don't have permission.".to_string(),
    404 => "Requested resource not found.".to_string(),
    500 => "Server error. Please try again later.".to_string(),
    _ => {
      let server_message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("Unknown error");
      format!("Error {}: {}", status, server_message)
    }
  }
}
