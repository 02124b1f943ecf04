//! Insight store error types
//!
//! Only persistence *writes* surface errors to callers; unreadable or
//! corrupt stored state is recovered by falling back to an empty aggregate.

use thiserror::Error;

/// Errors that can occur in the insight store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom blob backend failure
    #[error("Blob store error: {0}")]
    Blob(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
