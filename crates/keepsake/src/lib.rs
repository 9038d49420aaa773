//! keepsake: persist a state tree on every change, restore it on startup.
//!
//! # Architecture
//!
//! ```text
//! Store::commit(kind, payload)
//!   ├── mutation handler      ← applies the change to the state tree
//!   └── Interceptor::observe  ← filter the resulting state, write snapshot
//!         └── StorageAdapter::write
//!
//! Persistence::attach(store)
//!   ├── registers keepsake/rehydrate-apply  (shallow merge, never persisted)
//!   ├── registers keepsake/rehydrate        (read storage, commit merge)
//!   └── subscribes the Interceptor
//! ```
//!
//! Persistence is best-effort: storage failures are logged and never reach
//! the code that triggered the change.

pub mod error;
pub mod filter;
pub mod interceptor;
pub mod persist;
pub mod rehydrate;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use interceptor::{Interceptor, Outcome};
pub use persist::{PersistOptions, PersistedStore, Persistence};
pub use rehydrate::{RehydrationState, Sequencer};
pub use store::Store;

pub use keepsake_core::{Change, PersistConfig, StateTree};
pub use keepsake_storage::{ErrorSink, RedbStorage, StorageAdapter, StorageError};
