//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Errors are categorized by where they happened (network, HTTP status,
//! local storage, local validation). Every variant renders a message fit for
//! a toast via [`ApiError::user_message`]: the backend's own `message`/`error`
//! text when the body carries one, otherwise a status-keyed default.

use serde_json::Value;

pub const NETWORK_ERROR_MESSAGE: &str = "Unable to reach the server. Please check your internet connection.";

/// Stable machine-readable code plus retry hint for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Errors produced by client operations.
///
/// `Clone` because a single refresh failure is delivered to every request
/// waiting on that refresh.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No response was received (DNS, connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String, body: String },

    /// Authentication could not be recovered; credentials were cleared.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Reading or writing stored credentials failed.
    #[error("credential storage failed: {0}")]
    Storage(String),

    /// Local form validation rejected the input before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The request queue worker is gone.
    #[error("request queue closed")]
    QueueClosed,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Build a status error, deriving the message from the body when possible.
    #[must_use]
    pub fn from_response(status: u16, body: String) -> Self {
        let message = message_from_body(&body).unwrap_or_else(|| default_status_message(status).to_owned());
        Self::Status { status, message, body }
    }

    /// HTTP status, when the backend produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Human-readable message for toast display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_owned(),
            Self::Status { message, .. } => message.clone(),
            Self::SessionExpired(_) => default_status_message(401).to_owned(),
            Self::Decode(_) => "The server sent an unexpected response.".to_owned(),
            Self::Storage(e) => format!("Could not access saved credentials: {e}"),
            Self::Validation(msg) => msg.clone(),
            Self::QueueClosed => "The request queue is no longer running.".to_owned(),
            Self::HttpClientBuild(_) => "The HTTP client could not be initialized.".to_owned(),
        }
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Status { status: 400, .. } => "E_BAD_REQUEST",
            Self::Status { status: 401, .. } => "E_UNAUTHORIZED",
            Self::Status { status: 403, .. } => "E_FORBIDDEN",
            Self::Status { status: 404, .. } => "E_NOT_FOUND",
            Self::Status { status: 409, .. } => "E_CONFLICT",
            Self::Status { status: 422, .. } => "E_UNPROCESSABLE",
            Self::Status { status: 429, .. } => "E_RATE_LIMITED",
            Self::Status { status: 500..=599, .. } => "E_SERVER",
            Self::Status { .. } => "E_HTTP",
            Self::SessionExpired(_) => "E_SESSION_EXPIRED",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::Validation(_) => "E_VALIDATION",
            Self::QueueClosed => "E_QUEUE_CLOSED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Default toast text for a status when the body has nothing better.
#[must_use]
pub fn default_status_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request. Please check your input.",
        401 => "Your session has expired. Please log in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "This resource already exists.",
        422 => "Validation failed. Please check your input.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 => "Server error. Please try again later.",
        502 | 503 | 504 => "The service is temporarily unavailable. Please try again later.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Best-effort extraction of a message from a JSON error body.
///
/// Recognizes `{"message": ".."}`, `{"error": ".."}`,
/// `{"error": {"message": ".."}}` and `{"errors": [{"msg"|"message": ".."}]}`.
fn message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let non_empty = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);

    if let Some(msg) = value.get("message").and_then(non_empty) {
        return Some(msg);
    }
    match value.get("error") {
        Some(Value::String(_)) => {
            if let Some(msg) = value.get("error").and_then(non_empty) {
                return Some(msg);
            }
        }
        Some(Value::Object(obj)) => {
            if let Some(msg) = obj.get("message").and_then(non_empty) {
                return Some(msg);
            }
        }
        _ => {}
    }
    value
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errs| errs.first())
        .and_then(|first| first.get("msg").or_else(|| first.get("message")))
        .and_then(non_empty)
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
