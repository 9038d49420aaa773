//! RedbStorage: the built-in storage adapter.
//!
//! One redb table holds every snapshot, keyed by storage key, so several
//! adapters can share a database file as long as their keys differ. Two
//! adapters on the same key overwrite each other; last write wins.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use keepsake_core::StateTree;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::{debug, warn};

use crate::adapter::{ErrorSink, StorageAdapter};
use crate::error::{StorageError, StorageResult};
use crate::tables::SNAPSHOTS;

/// Encoding stored in place of a snapshot that fails to serialize.
const EMPTY_MAPPING: &[u8] = b"{}";

/// Convert any `Display` error into a `StorageError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StorageError::$variant(e.to_string())
    };
}

/// Storage adapter backed by a redb database.
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
    key: String,
    sink: Option<ErrorSink>,
}

impl fmt::Debug for RedbStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStorage")
            .field("key", &self.key)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl RedbStorage {
    /// Open (or create) a database file and bind the adapter to `key`.
    pub fn open(path: &Path, key: impl Into<String>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let storage = Self::from_database(db, key.into())?;
        debug!(?path, key = %storage.key, "snapshot storage opened");
        Ok(storage)
    }

    /// Create an ephemeral in-memory database bound to `key`.
    pub fn open_in_memory(key: impl Into<String>) -> StorageResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let storage = Self::from_database(db, key.into())?;
        debug!(key = %storage.key, "in-memory snapshot storage opened");
        Ok(storage)
    }

    fn from_database(db: Database, key: String) -> StorageResult<Self> {
        let storage = Self {
            db: Arc::new(db),
            key,
            sink: None,
        };
        storage.ensure_table()?;
        Ok(storage)
    }

    /// Create the snapshots table if it doesn't exist yet.
    fn ensure_table(&self) -> StorageResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(SNAPSHOTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Another adapter over the same database, bound to a different key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            db: Arc::clone(&self.db),
            key: key.into(),
            sink: self.sink.clone(),
        }
    }

    /// Forward absorbed failures to `sink` in addition to logging them.
    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored snapshot. `Ok(None)` means no entry exists.
    pub fn load(&self) -> StorageResult<Option<StateTree>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SNAPSHOTS).map_err(map_err!(Table))?;
        match table.get(self.key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let tree: StateTree =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(tree))
            }
            None => Ok(None),
        }
    }

    /// Serialize and store `snapshot`, replacing any previous entry.
    pub fn save(&self, snapshot: &StateTree) -> StorageResult<()> {
        let value = serde_json::to_vec(snapshot).map_err(map_err!(Serialize))?;
        self.put_bytes(&value)
    }

    /// Remove the stored entry. Returns true if one existed.
    pub fn clear(&self) -> StorageResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SNAPSHOTS).map_err(map_err!(Table))?;
            existed = table
                .remove(self.key.as_str())
                .map_err(map_err!(Write))?
                .is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = %self.key, existed, "snapshot cleared");
        Ok(existed)
    }

    pub(crate) fn put_bytes(&self, value: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SNAPSHOTS).map_err(map_err!(Table))?;
            table
                .insert(self.key.as_str(), value)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = %self.key, bytes = value.len(), "snapshot stored");
        Ok(())
    }

    fn report(&self, err: &StorageError) {
        warn!(key = %self.key, error = %err, "snapshot storage failure absorbed");
        if let Some(sink) = &self.sink {
            sink(err);
        }
    }
}

impl StorageAdapter for RedbStorage {
    fn read(&self) -> StateTree {
        match self.load() {
            Ok(Some(tree)) => tree,
            Ok(None) => StateTree::new(),
            Err(e) => {
                self.report(&e);
                StateTree::new()
            }
        }
    }

    fn write(&self, snapshot: &StateTree) {
        let value = match serde_json::to_vec(snapshot) {
            Ok(value) => value,
            Err(e) => {
                self.report(&StorageError::Serialize(e.to_string()));
                EMPTY_MAPPING.to_vec()
            }
        };
        if let Err(e) = self.put_bytes(&value) {
            self.report(&e);
        }
    }
}
