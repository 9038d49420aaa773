//! Store: a minimal synchronous state container.
//!
//! State changes only through named mutations. Observers run after every
//! applied mutation, in registration order, before `commit` returns.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use keepsake_core::{Change, StateTree};
use serde_json::Value;
use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Applies a payload to the state tree.
pub type Mutation = Box<dyn Fn(&mut StateTree, &Value)>;

/// Named callable bound to a store; may commit any number of mutations.
pub type Action = Rc<dyn Fn(&mut Store, Value) -> StoreResult<()>>;

/// Called with the applied change and the resulting state.
pub type Observer = Box<dyn FnMut(&Change, &StateTree)>;

pub struct Store {
    state: StateTree,
    mutations: HashMap<String, Mutation>,
    actions: HashMap<String, Action>,
    observers: Vec<Observer>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Store {
    pub fn new(initial: StateTree) -> Self {
        Self {
            state: initial,
            mutations: HashMap::new(),
            actions: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Register a named mutation. Names are unique per store.
    pub fn register_mutation<F>(&mut self, name: impl Into<String>, handler: F) -> StoreResult<()>
    where
        F: Fn(&mut StateTree, &Value) + 'static,
    {
        let name = name.into();
        if self.mutations.contains_key(&name) {
            return Err(StoreError::Duplicate(name));
        }
        self.mutations.insert(name, Box::new(handler));
        Ok(())
    }

    /// Register a named action. Names are unique per store.
    pub fn register_action<F>(&mut self, name: impl Into<String>, action: F) -> StoreResult<()>
    where
        F: Fn(&mut Store, Value) -> StoreResult<()> + 'static,
    {
        let name = name.into();
        if self.actions.contains_key(&name) {
            return Err(StoreError::Duplicate(name));
        }
        self.actions.insert(name, Rc::new(action));
        Ok(())
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Change, &StateTree) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Apply the named mutation, then notify every observer.
    pub fn commit(&mut self, kind: &str, payload: Value) -> StoreResult<()> {
        let handler = self
            .mutations
            .get(kind)
            .ok_or_else(|| StoreError::UnknownMutation(kind.to_string()))?;
        handler(&mut self.state, &payload);
        trace!(%kind, "mutation applied");

        let change = Change::new(kind, payload);
        for observer in &mut self.observers {
            observer(&change, &self.state);
        }
        Ok(())
    }

    /// Run the named action against this store.
    pub fn dispatch(&mut self, name: &str, payload: Value) -> StoreResult<()> {
        let action = self
            .actions
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownAction(name.to_string()))?;
        action(self, payload)
    }

    pub fn state(&self) -> &StateTree {
        &self.state
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn has_mutation(&self, name: &str) -> bool {
        self.mutations.contains_key(name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn into_state(self) -> StateTree {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn counter_store() -> Store {
        let mut store = Store::new(json!({"count": 0}).as_object().unwrap().clone());
        store
            .register_mutation("increment", |state, payload| {
                let by = payload.get("by").and_then(Value::as_i64).unwrap_or(1);
                let count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
                state.insert("count".to_string(), json!(count + by));
            })
            .unwrap();
        store
    }

    #[test]
    fn commit_applies_mutation() {
        let mut store = counter_store();
        store.commit("increment", json!({"by": 3})).unwrap();
        assert_eq!(store.get("count"), Some(&json!(3)));
    }

    #[test]
    fn commit_unknown_mutation_fails() {
        let mut store = counter_store();
        let err = store.commit("nope", json!(null)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownMutation(name) if name == "nope"));
    }

    #[test]
    fn duplicate_mutation_rejected() {
        let mut store = counter_store();
        let err = store.register_mutation("increment", |_, _| {}).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn observers_see_resulting_state_in_order() {
        let mut store = counter_store();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            store.subscribe(move |change, state| {
                log.borrow_mut()
                    .push(format!("{tag}:{}:{}", change.kind, state["count"]));
            });
        }

        store.commit("increment", json!({"by": 2})).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["first:increment:2".to_string(), "second:increment:2".to_string()]
        );
    }

    #[test]
    fn dispatch_runs_action_that_commits() {
        let mut store = counter_store();
        store
            .register_action("bump_twice", |store, payload| {
                store.commit("increment", payload.clone())?;
                store.commit("increment", payload)
            })
            .unwrap();

        store.dispatch("bump_twice", json!({"by": 5})).unwrap();
        assert_eq!(store.get("count"), Some(&json!(10)));
    }

    #[test]
    fn dispatch_unknown_action_fails() {
        let mut store = counter_store();
        assert!(matches!(
            store.dispatch("missing", json!(null)),
            Err(StoreError::UnknownAction(_))
        ));
        assert!(store.has_mutation("increment"));
        assert!(!store.has_action("missing"));
    }
}
