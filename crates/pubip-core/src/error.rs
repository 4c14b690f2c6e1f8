//! Error types for the pubip service
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for pubip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the pubip service
#[derive(Error, Debug)]
pub enum Error {
    /// Probe-related errors (upstream lookup failures)
    #[error("probe error: {0}")]
    Probe(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP surface errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
