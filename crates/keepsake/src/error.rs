//! Error types for the keepsake container.

use keepsake_storage::StorageError;
use thiserror::Error;

/// Result type alias for container operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the container and the composition root.
///
/// Persistence failures are absorbed by the storage adapter and never
/// appear here; `Storage` only covers opening the default adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown mutation: {0}")]
    UnknownMutation(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("already registered: {0}")]
    Duplicate(String),

    #[error("name is reserved for rehydration: {0}")]
    ReservedName(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
