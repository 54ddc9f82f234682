//! Last-writer-wins register and map
//!
//! Writes carry `(timestamp, writer)`; on merge the newer timestamp wins
//! and ties break toward the lexicographically larger writer id, which is
//! deterministic across replicas. A writer must never issue two different
//! values at the same timestamp.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrysalis_core::identifiers::InstanceId;
use chrysalis_core::time::Timestamp;

use crate::Merge;

/// A single tagged write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwEntry<T> {
    /// Written value
    pub value: T,
    /// Write timestamp
    pub timestamp: Timestamp,
    /// Writing instance
    pub writer: InstanceId,
}

impl<T> LwwEntry<T> {
    fn wins_over(&self, other: &LwwEntry<T>) -> bool {
        (self.timestamp, &self.writer) > (other.timestamp, &other.writer)
    }
}

/// Last-writer-wins register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwRegister<T>(Option<LwwEntry<T>>);

impl<T: Clone> LwwRegister<T> {
    /// Register with no write yet
    pub fn new() -> Self {
        Self(None)
    }

    /// Record a write if it beats the current entry
    pub fn set(&mut self, value: T, timestamp: Timestamp, writer: InstanceId) {
        let entry = LwwEntry {
            value,
            timestamp,
            writer,
        };
        match &self.0 {
            Some(current) if !entry.wins_over(current) => {}
            _ => self.0 = Some(entry),
        }
    }

    /// The current value, if any write has occurred
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref().map(|e| &e.value)
    }

    /// The full winning entry
    pub fn entry(&self) -> Option<&LwwEntry<T>> {
        self.0.as_ref()
    }
}

impl<T: Clone> Default for LwwRegister<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq> Merge for LwwRegister<T> {
    fn merge(&self, other: &Self) -> Self {
        match (&self.0, &other.0) {
            (None, None) => Self(None),
            (Some(_), None) => self.clone(),
            (None, Some(_)) => other.clone(),
            (Some(a), Some(b)) => {
                if b.wins_over(a) {
                    other.clone()
                } else {
                    self.clone()
                }
            }
        }
    }
}

/// Per-key last-writer-wins map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwMap<K: Ord, V>(BTreeMap<K, LwwRegister<V>>);

impl<K: Ord + Clone, V: Clone + PartialEq> LwwMap<K, V> {
    /// Empty map
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Write a key
    pub fn set(&mut self, key: K, value: V, timestamp: Timestamp, writer: InstanceId) {
        self.0
            .entry(key)
            .or_insert_with(LwwRegister::new)
            .set(value, timestamp, writer);
    }

    /// Current value for a key
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.get(key).and_then(|r| r.get())
    }

    /// Number of keys with a value
    pub fn len(&self) -> usize {
        self.0.values().filter(|r| r.get().is_some()).count()
    }

    /// Whether no keys have values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate keys and current values
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter().filter_map(|(k, r)| r.get().map(|v| (k, v)))
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> Default for LwwMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> Merge for LwwMap<K, V> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.0.clone();
        for (key, register) in &other.0 {
            merged
                .entry(key.clone())
                .and_modify(|r| *r = r.merge(register))
                .or_insert_with(|| register.clone());
        }
        Self(merged)
    }
}
