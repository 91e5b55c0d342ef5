//! Error types for the Cadence backend client.

use thiserror::Error;

/// Errors that can occur when talking to the queue backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The requested track does not exist
    #[error("Track not found: {0}")]
    NotFound(String),

    /// Invalid backend URL
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse backend response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Backend is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ClientError {
    /// Map a transport failure, separating "nobody answered" from other failures
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ServerUnreachable(err.to_string())
        } else {
            Self::Request(err)
        }
    }

    /// Whether the failure means the title resolves to nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Pull a human-readable message out of an error body.
///
/// The backend answers with `{"error": "..."}`, `{"error": ["...", ...]}` or
/// `{"message": "..."}` depending on the route; anything else is passed
/// through as trimmed text.
pub(crate) fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    let field = value.get("error").or_else(|| value.get("message"));
    match field {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(serde_json::Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.trim().to_string(),
    }
}
