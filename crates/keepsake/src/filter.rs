//! Filter policy: which part of the state tree gets persisted.

use std::fmt;
use std::sync::Arc;

use keepsake_core::{StateTree, is_truthy};

/// Selects the subset of state written to storage.
#[derive(Clone, Default)]
pub enum Filter {
    /// Persist the whole state tree.
    #[default]
    Identity,
    /// Persist only these keys, and only while their values are truthy.
    /// Falsy or absent keys are left out of the snapshot entirely.
    Keys(Vec<String>),
    /// Persist whatever the function returns. No post-filtering.
    Transform(Arc<dyn Fn(&StateTree) -> StateTree + Send + Sync>),
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Identity => f.write_str("Identity"),
            Filter::Keys(keys) => f.debug_tuple("Keys").field(keys).finish(),
            Filter::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl Filter {
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&StateTree) -> StateTree + Send + Sync + 'static,
    {
        Filter::Transform(Arc::new(f))
    }

    /// Compute the snapshot to persist from the full state.
    pub fn apply(&self, state: &StateTree) -> StateTree {
        match self {
            Filter::Identity => state.clone(),
            Filter::Keys(keys) => keys
                .iter()
                .filter_map(|key| {
                    state
                        .get(key)
                        .filter(|value| is_truthy(value))
                        .map(|value| (key.clone(), value.clone()))
                })
                .collect(),
            Filter::Transform(f) => f(state),
        }
    }
}

impl From<Option<Vec<String>>> for Filter {
    fn from(keys: Option<Vec<String>>) -> Self {
        keys.map_or(Filter::Identity, Filter::Keys)
    }
}
