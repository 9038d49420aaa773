//! Composition root: attach persistence to a store.
//!
//! `Persistence::attach` wraps an existing [`Store`] rather than replacing
//! it. It registers the rehydration merge handler and action under the
//! reserved `keepsake/` names, subscribes the [`Interceptor`], and runs the
//! [`Sequencer`] once when auto-rehydration is on.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use keepsake_core::{DEFAULT_KEY, PersistConfig, REHYDRATE_ACTION, REHYDRATE_APPLY, StateTree};
use keepsake_storage::{RedbStorage, StorageAdapter};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::interceptor::Interceptor;
use crate::rehydrate::{self, RehydrationState, Sequencer};
use crate::store::Store;

#[derive(Clone)]
pub struct PersistOptions {
    /// Storage key for the built-in adapter. Ignored when `storage` is set.
    pub key: String,
    /// Adapter override. `None` opens an in-memory redb database.
    pub storage: Option<Arc<dyn StorageAdapter>>,
    pub filter: Filter,
    /// Rehydrate once while attaching.
    pub rehydrate: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            storage: None,
            filter: Filter::Identity,
            rehydrate: true,
        }
    }
}

impl fmt::Debug for PersistOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistOptions")
            .field("key", &self.key)
            .field("storage", &self.storage.as_ref().map(|_| ".."))
            .field("filter", &self.filter)
            .field("rehydrate", &self.rehydrate)
            .finish()
    }
}

impl PersistOptions {
    /// Build options from a parsed config, opening the configured database.
    pub fn from_config(config: &PersistConfig) -> anyhow::Result<Self> {
        let storage = match &config.storage.path {
            Some(path) => RedbStorage::open(path, config.key.as_str())?,
            None => RedbStorage::open_in_memory(config.key.as_str())?,
        };
        Ok(Self {
            key: config.key.clone(),
            storage: Some(Arc::new(storage)),
            filter: Filter::from(config.filter.clone()),
            rehydrate: config.rehydrate,
        })
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_rehydrate(mut self, rehydrate: bool) -> Self {
        self.rehydrate = rehydrate;
        self
    }
}

#[derive(Debug, Default)]
pub struct Persistence {
    options: PersistOptions,
}

impl Persistence {
    pub fn new(options: PersistOptions) -> Self {
        Self { options }
    }

    /// Attach persistence to `store`.
    ///
    /// Fails if the store already uses a reserved name, or if the default
    /// adapter cannot be opened. Nothing is registered on failure.
    pub fn attach(self, mut store: Store) -> StoreResult<PersistedStore> {
        for name in [REHYDRATE_APPLY, REHYDRATE_ACTION] {
            if store.has_mutation(name) || store.has_action(name) {
                return Err(StoreError::ReservedName(name.to_string()));
            }
        }

        let PersistOptions {
            key,
            storage,
            filter,
            rehydrate,
        } = self.options;
        let storage: Arc<dyn StorageAdapter> = match storage {
            Some(storage) => storage,
            None => Arc::new(RedbStorage::open_in_memory(key)?),
        };

        store.register_mutation(REHYDRATE_APPLY, rehydrate::merge)?;

        let sequencer = Rc::new(Sequencer::new(Arc::clone(&storage)));
        let action_sequencer = Rc::clone(&sequencer);
        store.register_action(REHYDRATE_ACTION, move |store, _payload| {
            action_sequencer.run(store)
        })?;

        let interceptor = Rc::new(Interceptor::new(Arc::clone(&storage), filter));
        let observer = Rc::clone(&interceptor);
        store.subscribe(move |change, state| {
            observer.observe(change, state);
        });

        let mut persisted = PersistedStore {
            store,
            storage,
            interceptor,
            sequencer,
        };
        if rehydrate {
            persisted.rehydrate()?;
        }
        debug!(rehydrated = rehydrate, "persistence attached");
        Ok(persisted)
    }
}

/// A store with persistence attached.
pub struct PersistedStore {
    store: Store,
    storage: Arc<dyn StorageAdapter>,
    interceptor: Rc<Interceptor>,
    sequencer: Rc<Sequencer>,
}

impl fmt::Debug for PersistedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedStore")
            .field("store", &self.store)
            .field("rehydration", &self.sequencer.state())
            .finish()
    }
}

impl PersistedStore {
    pub fn commit(&mut self, kind: &str, payload: Value) -> StoreResult<()> {
        self.store.commit(kind, payload)
    }

    pub fn dispatch(&mut self, name: &str, payload: Value) -> StoreResult<()> {
        self.store.dispatch(name, payload)
    }

    /// Read storage and merge it into the live state again.
    pub fn rehydrate(&mut self) -> StoreResult<()> {
        self.store.dispatch(REHYDRATE_ACTION, Value::Null)
    }

    /// Persist the current state now, whatever the last change was.
    pub fn flush(&self) {
        self.interceptor.persist(self.store.state());
    }

    pub fn rehydration_state(&self) -> RehydrationState {
        self.sequencer.state()
    }

    pub fn state(&self) -> &StateTree {
        self.store.state()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn into_inner(self) -> Store {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> StateTree {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn default_options() {
        let options = PersistOptions::default();
        assert_eq!(options.key, "keepsake");
        assert!(options.storage.is_none());
        assert!(matches!(options.filter, Filter::Identity));
        assert!(options.rehydrate);
    }

    #[test]
    fn attach_with_default_storage_rehydrates_empty() {
        let store = Store::new(tree(json!({"count": 0})));
        let persisted = Persistence::default().attach(store).unwrap();

        assert_eq!(persisted.rehydration_state(), RehydrationState::Done);
        assert_eq!(persisted.state(), &tree(json!({"count": 0})));
        assert!(persisted.storage().read().is_empty());
    }

    #[test]
    fn attach_without_rehydrate_stays_pending() {
        let options = PersistOptions::default().with_rehydrate(false);
        let persisted = Persistence::new(options)
            .attach(Store::new(StateTree::new()))
            .unwrap();
        assert_eq!(persisted.rehydration_state(), RehydrationState::Pending);
    }

    #[test]
    fn reserved_mutation_name_rejected() {
        let mut store = Store::new(StateTree::new());
        store.register_mutation(REHYDRATE_APPLY, |_, _| {}).unwrap();

        let err = Persistence::default().attach(store).unwrap_err();
        assert!(matches!(err, StoreError::ReservedName(name) if name == REHYDRATE_APPLY));
    }

    #[test]
    fn reserved_action_name_rejected() {
        let mut store = Store::new(StateTree::new());
        store.register_action(REHYDRATE_ACTION, |_, _| Ok(())).unwrap();

        assert!(matches!(
            Persistence::default().attach(store),
            Err(StoreError::ReservedName(_))
        ));
    }

    #[test]
    fn reserved_names_locked_after_attach() {
        let persisted = Persistence::default()
            .attach(Store::new(StateTree::new()))
            .unwrap();
        let mut store = persisted.into_inner();

        assert!(matches!(
            store.register_mutation(REHYDRATE_APPLY, |_, _| {}),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn from_config_uses_key_and_filter() {
        let config = PersistConfig::from_toml_str(
            r#"
key = "todo-app"
rehydrate = false
filter = ["todos"]
"#,
        )
        .unwrap();
        let options = PersistOptions::from_config(&config).unwrap();

        assert_eq!(options.key, "todo-app");
        assert!(!options.rehydrate);
        assert!(matches!(&options.filter, Filter::Keys(keys) if keys == &["todos"]));
        assert!(options.storage.is_some());
    }
}
