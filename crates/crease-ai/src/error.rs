//! Error types for crease-ai

use thiserror::Error;

/// Result type alias using crease-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a generation server
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Server reported an error in the reply body
    #[error("Server error: {0}")]
    Server(String),

    /// Response body broke off or was unreadable
    #[error("Stream error: {0}")]
    Stream(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error from an HTTP status code and response body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether the server could not be reached at all
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::Stream(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("connection") || msg.contains("reset") || msg.contains("closed")
            }
            _ => false,
        }
    }

    /// Whether the server reported that the requested model does not exist
    pub fn is_model_missing(&self) -> bool {
        match self {
            Error::Status { status, body } => {
                *status == 404 || body.to_lowercase().contains("not found")
            }
            Error::Server(msg) => msg.to_lowercase().contains("not found"),
            _ => false,
        }
    }
}
