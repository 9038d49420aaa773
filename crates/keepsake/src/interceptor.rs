//! Change interceptor: persists a filtered snapshot after each applied change.

use std::sync::Arc;

use keepsake_core::{Change, StateTree};
use keepsake_storage::StorageAdapter;
use tracing::debug;

use crate::filter::Filter;

/// What the interceptor did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Persisted,
    /// The change was the rehydration merge itself.
    SkippedRehydration,
    SkippedEmptyPayload,
}

pub struct Interceptor {
    storage: Arc<dyn StorageAdapter>,
    filter: Filter,
}

impl Interceptor {
    pub fn new(storage: Arc<dyn StorageAdapter>, filter: Filter) -> Self {
        Self { storage, filter }
    }

    /// Observe one applied change and the state it produced.
    ///
    /// Writes at most once and never fails; the storage adapter absorbs
    /// its own errors.
    pub fn observe(&self, change: &Change, state: &StateTree) -> Outcome {
        if change.is_rehydration() {
            return Outcome::SkippedRehydration;
        }
        if change.has_empty_payload() {
            debug!(kind = %change.kind, "empty payload, snapshot not persisted");
            return Outcome::SkippedEmptyPayload;
        }
        self.persist(state);
        Outcome::Persisted
    }

    /// Filter `state` and write the snapshot unconditionally.
    pub fn persist(&self, state: &StateTree) {
        let snapshot = self.filter.apply(state);
        debug!(keys = snapshot.len(), "persisting snapshot");
        self.storage.write(&snapshot);
    }
}
