//! The storage adapter contract.

use std::sync::Arc;

use keepsake_core::StateTree;

use crate::error::StorageError;

/// Side-channel for failures that the adapter absorbs.
pub type ErrorSink = Arc<dyn Fn(&StorageError) + Send + Sync>;

/// Durable read/write of a single serialized state tree under one key.
///
/// Neither method may fail outward. `read` returns an empty mapping when
/// nothing usable is stored; `write` stores an empty mapping when the
/// snapshot cannot be encoded.
pub trait StorageAdapter: Send + Sync {
    fn read(&self) -> StateTree;

    fn write(&self, snapshot: &StateTree);
}
