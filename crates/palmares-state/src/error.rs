//! Error types for palmares-state

use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage backend '{backend}' unavailable: {detail}")]
    Unavailable { backend: String, detail: String },

    /// A record was requested by id but does not exist.
    #[error("record '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// A stored record failed schema validation on decode.
    #[error("corrupt record in collection '{collection}': {detail}")]
    Corrupt { collection: String, detail: String },

    /// The backend did not answer within its configured timeout.
    #[error("storage backend '{backend}' timed out")]
    Timeout { backend: String },

    /// JSON encode/decode error at the storage boundary.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error from the file-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
