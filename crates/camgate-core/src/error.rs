//! Error types for `camgate` core library.

use thiserror::Error;

/// Result type alias using `camgate` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `camgate` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Capability name rejected
    #[error("Invalid capability name: {0:?}")]
    InvalidCapability(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
