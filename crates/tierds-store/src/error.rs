use std::path::PathBuf;

use tierds_types::{DatastoreKey, Interrupted};

/// Errors from datastore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value is stored under the key.
    #[error("key not found: {0}")]
    NotFound(DatastoreKey),

    /// The key cannot be stored by this backend.
    #[error("invalid key: {0}")]
    InvalidKey(DatastoreKey),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The shard function identifier is not recognised.
    #[error("invalid shard function: {0}")]
    InvalidShardFunction(String),

    /// An existing store was created with a different shard function.
    #[error("datastore at {path} uses shard function {found}, not {expected}")]
    ShardMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The directory exists but is not an initialised store.
    #[error("missing SHARDING file in {0}")]
    NotInitialized(PathBuf),

    /// The caller's context was cancelled or timed out.
    #[error("interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
