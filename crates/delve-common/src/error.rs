//! Error types for Delve.

use thiserror::Error;

/// Top-level error type for Delve operations.
#[derive(Debug, Error)]
pub enum DelveError {
    /// Level/world data errors
    #[error("Level error: {0}")]
    Level(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Delve operations.
pub type DelveResult<T> = Result<T, DelveError>;
