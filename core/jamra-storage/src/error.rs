//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Stored data violates the expected shape (e.g. a cache row without
    /// the JSON envelope).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Connection mutex was poisoned by a panicking writer.
    #[error("storage lock poisoned: {reason}")]
    LockPoisoned { reason: String },
}

impl From<StorageError> for jamra_cache::CacheError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => Self::Serialization(e),
            StorageError::LockPoisoned { reason } => Self::LockPoisoned { reason },
            other => Self::Backend(other.to_string()),
        }
    }
}
