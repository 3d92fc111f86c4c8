//! Error types for submission delivery.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while sending submissions or saving failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    /// The request never produced a response (connect, timeout, body I/O).
    #[error("{0}")]
    Network(String),

    /// The API token cannot be sent as an HTTP header.
    #[error("invalid API token: {0}")]
    InvalidToken(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The failure log could not be written.
    #[error("failed to write failure log {path}: {message}")]
    FailureLog { path: PathBuf, message: String },
}

impl SubmitError {
    /// Whether the error happened before any response was received.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, SubmitError>;
