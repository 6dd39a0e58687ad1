//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection does not exist.
    #[error("Unknown collection \"{0}\"")]
    UnknownCollection(String),

    /// Collection or key cannot be used as a storage address.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Record not found where one was required.
    #[error("Record not found: {collection}/{key}")]
    NotFound {
        /// Collection name.
        collection: String,
        /// Record key.
        key: String,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON for the requested type.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a not found error for a record.
    #[must_use]
    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
