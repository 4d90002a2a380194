//! Plain nested key/value containers.
//!
//! A [`Table`] is a shared, ordered map from string keys to [`Node`]s. It
//! never notifies anyone when it changes, so resolvers observe tables by
//! polling once per scheduler tick.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::node::Node;

/// Shared, mutable, insertion-ordered key/value container.
///
/// Cloning a table yields another handle onto the same entries.
#[derive(Clone, Default)]
pub struct Table {
    entries: Arc<RwLock<IndexMap<String, Node>>>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Node> {
        self.entries.read().get(key).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.write().insert(key.into(), value.into())
    }

    /// Removes the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Node> {
        self.entries.write().shift_remove(key)
    }

    /// Returns whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns `true` if both handles refer to the same table.
    #[must_use]
    pub fn same_table(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Builds a table from a JSON object.
    ///
    /// Returns `None` if `value` is neither an object nor an array.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Table> {
        match Node::from_json(value) {
            Node::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
