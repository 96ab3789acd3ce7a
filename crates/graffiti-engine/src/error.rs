use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// `NotFound` deliberately conflates "absent", "tombstoned", and "exists
/// but invisible under access control" so callers cannot probe for the
/// presence of restricted objects. Transient backend conditions (view
/// re-installation conflicts) are absorbed before reaching this type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Target url absent, tombstoned, invisible to the caller, or an
    /// unrecognized cursor.
    #[error("not found")]
    NotFound,

    /// Write to an object owned by another actor, or a cursor bound to a
    /// different actor than the session.
    #[error("forbidden")]
    Forbidden,

    /// The object was read but fails the compiled schema predicate.
    #[error("object does not match schema")]
    SchemaMismatch,

    /// Schema compilation failed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Url fails decoding.
    #[error(transparent)]
    InvalidUrl(#[from] graffiti_types::TypeError),

    /// A draft whose payload is not a JSON object.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Storage backend failure.
    #[error(transparent)]
    Store(#[from] graffiti_store::StoreError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
