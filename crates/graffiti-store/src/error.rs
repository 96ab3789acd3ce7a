use thiserror::Error;

/// Errors from storage backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A range scan named a view that was never installed.
    #[error("unknown view: {0}")]
    UnknownView(String),

    /// Serialization or deserialization failure inside the backend.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a persistent backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
