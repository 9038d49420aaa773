//! Shared data model for keepsake.
//!
//! The state tree is a JSON object: field name to arbitrary value. Changes
//! are named events carrying a JSON payload. Everything that crosses the
//! storage boundary is one serialized `StateTree`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The full mapping of application state owned by a container.
pub type StateTree = Map<String, Value>;

/// Storage key used when none is configured.
pub const DEFAULT_KEY: &str = "keepsake";

/// Action name that runs the rehydration sequence.
pub const REHYDRATE_ACTION: &str = "keepsake/rehydrate";

/// Change kind that merges a rehydrated snapshot into live state.
/// Changes of this kind are never persisted.
pub const REHYDRATE_APPLY: &str = "keepsake/rehydrate-apply";

// ── Change ─────────────────────────────────────────────────────────

/// A named event applied to the state tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub kind: String,
    pub payload: Value,
}

impl Change {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// True for the internal rehydration merge.
    pub fn is_rehydration(&self) -> bool {
        self.kind == REHYDRATE_APPLY
    }

    /// True when the payload has a length and that length is zero.
    ///
    /// Empty objects, arrays and strings are empty. Numbers, booleans and
    /// `null` have no length and never count as empty.
    pub fn has_empty_payload(&self) -> bool {
        match &self.payload {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            Value::Null | Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

// ── Truthiness ─────────────────────────────────────────────────────

/// Loose truthiness used by key-set filtering.
///
/// `null`, `false`, zero and `""` are falsy. Arrays and objects are always
/// truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
