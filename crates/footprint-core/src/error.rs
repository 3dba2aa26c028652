//! Error types for footprint-core
//!
//! The estimator is total over every value it can classify: unsupported kinds
//! and codec failures degrade to `unknown` nodes. The variants here cover the
//! remaining conditions that do reach the caller.

use thiserror::Error;

/// Errors that can occur during size estimation and configuration
#[derive(Error, Debug)]
pub enum FootprintError {
    /// Traversal went deeper than the configured maximum depth
    #[error("Maximum depth {limit} exceeded at {id}")]
    DepthExceeded {
        /// Rendered id of the node that would have exceeded the limit
        id: String,
        /// The configured limit
        limit: usize,
    },

    /// The scalar codec refused or failed to encode a value
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid estimator configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing of configuration or fixtures failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FootprintError {
    /// Create a serialization error from any error type
    pub fn serialization<E: std::fmt::Display>(error: E) -> Self {
        Self::Serialization(error.to_string())
    }

    /// Create a configuration error from any error type
    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }
}

#[cfg(feature = "serialized")]
impl From<bincode::Error> for FootprintError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type alias for footprint operations
pub type Result<T> = std::result::Result<T, FootprintError>;
