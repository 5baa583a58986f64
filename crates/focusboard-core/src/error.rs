//! Centralized error types for Focusboard.

use thiserror::Error;

/// Main error type for Focusboard operations.
#[derive(Error, Debug)]
pub enum FocusError {
    /// The entity is absent remotely or from the active board.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote store rejected the payload.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An operation addressed an id the active board graph does not hold.
    #[error("Inconsistent board state: {0}")]
    Inconsistency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Focusboard operations.
pub type FocusResult<T> = Result<T, FocusError>;

impl FocusError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an inconsistency error.
    pub fn inconsistency(msg: impl Into<String>) -> Self {
        Self::Inconsistency(msg.into())
    }

    /// Whether the error came back from the remote store rather than the transport.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Validation(_) | Self::Unauthorized(_))
    }
}
