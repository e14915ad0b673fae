//! Error types for Continuum

use thiserror::Error;

/// Main error type for Continuum operations
#[derive(Error, Debug)]
pub enum ContinuumError {
    /// Snapshot persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Vectorization errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory operation errors
    #[error("Memory error: {0}")]
    Memory(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ContinuumError {
    fn from(e: serde_json::Error) -> Self {
        ContinuumError::Serialization(e.to_string())
    }
}

/// Result type alias for Continuum operations
pub type Result<T> = std::result::Result<T, ContinuumError>;
