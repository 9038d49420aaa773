//! redb table definitions for keepsake storage.

use redb::TableDefinition;

/// Serialized state trees keyed by storage key. Values are JSON bytes.
pub const SNAPSHOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");
