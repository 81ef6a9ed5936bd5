//! Error types for the chat clients
//!
//! The `Display` form of each completion error is what the front ends show
//! to the user in place of a reply.

use thiserror::Error;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {

    // =============================
    // Completion Call Errors
    // =============================

    /// Connection failure, timeout, or any transport-level problem
    #[error("Error: {0}")]
    Network(String),

    /// Non-2xx status from the completion endpoint
    #[error("Error: {status} {body}")]
    Http { status: u16, body: String },

    /// The response body carried an `error` field
    #[error("API Error: {0}")]
    Api(String),

    /// Missing or malformed fields in the response body
    #[error("Error parsing response: {0}")]
    Parse(String),

    // =============================
    // Local Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Whether this error came from the completion call rather than local I/O
    pub fn is_completion_error(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_) | ChatError::Http { .. } | ChatError::Api(_) | ChatError::Parse(_)
        )
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ChatError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ChatError::Network(err.to_string())
        }
    }
}
