//! Error Types

use thiserror::Error;

/// Result type alias for sonar operations
pub type Result<T> = std::result::Result<T, SonarError>;

/// Placeholder used when an error response body cannot be read
pub const UNREADABLE_BODY: &str = "<unable to read response body>";

/// Sonar error types
#[derive(Error, Debug)]
pub enum SonarError {
    /// Missing or unusable configuration (e.g. no API key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The outbound call itself failed (DNS, connect, timeout, body read)
    #[error("Network error while calling the chat completion API: {0}")]
    Transport(String),

    /// The upstream service answered with a non-success status
    #[error("Chat completion API returned {status} {status_text}: {body}")]
    UpstreamStatus {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The upstream service answered 2xx but the body is not JSON
    #[error("Failed to parse chat completion API response: {0}")]
    UpstreamParse(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments failed validation
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl SonarError {
    /// Check if error is retryable.
    ///
    /// Nothing in this workspace retries; callers embedding the client may.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
