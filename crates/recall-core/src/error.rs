//! Error types for recall

use thiserror::Error;

/// Core error type for recall operations
#[derive(Error, Debug)]
pub enum RecallError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Parameter position {0} is not bound")]
    UnboundParameter(u16),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for recall operations
pub type Result<T> = std::result::Result<T, RecallError>;
