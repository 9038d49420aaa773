//! keepsake-storage: durable snapshot storage for keepsake.
//!
//! A storage adapter owns exactly one key and stores one serialized state
//! tree under it. Reads and writes go straight to the backing medium; there
//! is no cache.
//!
//! # Architecture
//!
//! ```text
//! StorageAdapter (trait)      read() / write()  never fail outward
//!   └── RedbStorage           load() / save() / clear()  return StorageResult
//!         └── redb::Database  on-disk file or in-memory backend
//! ```
//!
//! Failures on the infallible path are logged with `tracing` and forwarded
//! to an optional [`ErrorSink`].

pub mod adapter;
pub mod error;
pub mod redb_storage;
pub mod tables;

pub use adapter::{ErrorSink, StorageAdapter};
pub use error::{StorageError, StorageResult};
pub use redb_storage::RedbStorage;
