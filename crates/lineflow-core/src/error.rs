//! Error types for the core domain
use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Manual group definition could not be parsed
    #[error("Invalid group configuration: {0}")]
    InvalidGroupConfig(String),

    /// Streaming datagram is truncated or inconsistent with its panel count
    #[error("Malformed stream frame: {0}")]
    MalformedFrame(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
