//! Rehydration: read the persisted snapshot and merge it into live state.

use std::cell::Cell;
use std::sync::Arc;

use keepsake_core::{REHYDRATE_APPLY, StateTree};
use keepsake_storage::StorageAdapter;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RehydrationState {
    #[default]
    Pending,
    Done,
}

/// Reads storage and commits the merge change. Running it again repeats
/// the read and merge, which overwrites any in-memory edits to the
/// persisted keys.
pub struct Sequencer {
    storage: Arc<dyn StorageAdapter>,
    state: Cell<RehydrationState>,
}

impl Sequencer {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            state: Cell::new(RehydrationState::Pending),
        }
    }

    pub fn run(&self, store: &mut Store) -> StoreResult<()> {
        let snapshot = self.storage.read();
        let keys = snapshot.len();
        store.commit(REHYDRATE_APPLY, Value::Object(snapshot))?;
        self.state.set(RehydrationState::Done);
        debug!(keys, "state rehydrated");
        Ok(())
    }

    pub fn state(&self) -> RehydrationState {
        self.state.get()
    }
}

/// Shallow merge: payload keys overwrite state keys, other keys stay.
pub fn merge(state: &mut StateTree, payload: &Value) {
    if let Value::Object(snapshot) = payload {
        for (key, value) in snapshot {
            state.insert(key.clone(), value.clone());
        }
    }
}
