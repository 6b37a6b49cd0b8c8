//! Error types for API requests and poll cycles

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::models::TrackerId;

/// Error returned by the authenticated request client
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    #[error("Transport error on {path}: {message}")]
    Transport { path: String, message: String },

    #[error("Request to {path} timed out after {}ms", .budget.as_millis())]
    Timeout { path: String, budget: Duration },

    #[error("Backend rejected {path} under both auth strategies: {}", describe_body(.last_body))]
    Application { path: String, last_body: Value },

    #[error("Unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl RequestError {
    /// API path the failing request was sent to
    pub fn path(&self) -> &str {
        match self {
            RequestError::Transport { path, .. }
            | RequestError::Timeout { path, .. }
            | RequestError::Application { path, .. }
            | RequestError::Decode { path, .. } => path,
        }
    }

    /// Taxonomy bucket used in published error records
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Application { .. } => ErrorKind::Application,
            RequestError::Transport { .. }
            | RequestError::Timeout { .. }
            | RequestError::Decode { .. } => ErrorKind::Transport,
        }
    }
}

/// Extract the backend's failure description (`status.description`) if present
fn describe_body(body: &Value) -> String {
    let status = body.get("status");
    let description = status
        .and_then(|s| s.get("description"))
        .and_then(Value::as_str);
    let code = status.and_then(|s| s.get("code")).and_then(Value::as_i64);

    match (code, description) {
        (Some(code), Some(description)) => format!("{} (code {})", description, code),
        (None, Some(description)) => description.to_string(),
        (Some(code), None) => format!("code {}", code),
        (None, None) => "no failure description".to_string(),
    }
}

/// Category of a published error record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Timeout, network failure or malformed response
    Transport,
    /// Backend returned a failure marker after both auth strategies
    Application,
    /// A roster tracker had no state entry
    PartialData,
}

/// One failure recorded during a poll cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    /// API path or tracker id the error applies to
    pub subject: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn from_request(error: &RequestError) -> Self {
        Self {
            kind: error.kind(),
            subject: error.path().to_string(),
            message: error.to_string(),
        }
    }

    pub fn partial_data(tracker_id: &TrackerId) -> Self {
        Self {
            kind: ErrorKind::PartialData,
            subject: tracker_id.to_string(),
            message: format!("No state reported for tracker {}", tracker_id),
        }
    }

    /// Whether this error invalidates the cycle (as opposed to partial data)
    pub fn is_fatal(&self) -> bool {
        self.kind != ErrorKind::PartialData
    }
}
