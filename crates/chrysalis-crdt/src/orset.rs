//! Observed-remove set
//!
//! Each add attaches a globally unique tag; a remove tombstones exactly the
//! tags observed locally. An element is present iff at least one of its
//! tags is live, so a concurrent re-add survives a remove that never
//! observed it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::Merge;

/// Unique tag attached to each add operation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AddTag(String);

impl AddTag {
    fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// An observed-remove set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrSet<T: Ord> {
    entries: BTreeMap<T, BTreeSet<AddTag>>,
    tombstones: BTreeSet<AddTag>,
}

impl<T: Ord + Clone> OrSet<T> {
    /// Empty set
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            tombstones: BTreeSet::new(),
        }
    }

    /// Add an element, returning the generated tag
    pub fn add(&mut self, value: T) -> AddTag {
        let tag = AddTag::fresh();
        self.entries
            .entry(value)
            .or_default()
            .insert(tag.clone());
        tag
    }

    /// Remove an element by tombstoning all locally observed tags
    ///
    /// Returns false when the element is not currently present.
    pub fn remove(&mut self, value: &T) -> bool {
        let mut removed = false;
        if let Some(tags) = self.entries.get(value) {
            for tag in tags {
                if !self.tombstones.contains(tag) {
                    removed = true;
                }
            }
            let observed: Vec<AddTag> = tags.iter().cloned().collect();
            self.tombstones.extend(observed);
        }
        removed
    }

    /// Whether the element has at least one live tag
    pub fn contains(&self, value: &T) -> bool {
        self.entries
            .get(value)
            .map(|tags| tags.iter().any(|t| !self.tombstones.contains(t)))
            .unwrap_or(false)
    }

    /// Live elements in order
    pub fn elements(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|(value, tags)| {
            if tags.iter().any(|t| !self.tombstones.contains(t)) {
                Some(value)
            } else {
                None
            }
        })
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.elements().count()
    }

    /// Whether no live elements remain
    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }
}

impl<T: Ord + Clone> Merge for OrSet<T> {
    fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (value, tags) in &other.entries {
            entries
                .entry(value.clone())
                .or_default()
                .extend(tags.iter().cloned());
        }
        let tombstones = self
            .tombstones
            .union(&other.tombstones)
            .cloned()
            .collect();
        Self { entries, tombstones }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_is_absent() {
        let mut set = OrSet::new();
        set.add("x");
        assert!(set.contains(&"x"));
        assert!(set.remove(&"x"));
        assert!(!set.contains(&"x"));
        assert!(!set.remove(&"x"));
    }

    #[test]
    fn concurrent_add_survives_unobserved_remove() {
        let mut replica_a = OrSet::new();
        replica_a.add("x");
        let mut replica_b = replica_a.clone();

        // A removes while B concurrently re-adds with a fresh tag
        replica_a.remove(&"x");
        replica_b.add("x");

        let merged = replica_a.merge(&replica_b);
        assert!(merged.contains(&"x"));
    }

    #[test]
    fn observed_remove_wins_over_merged_copy() {
        let mut replica_a = OrSet::new();
        replica_a.add("x");
        let replica_b = replica_a.clone();

        replica_a.remove(&"x");
        let merged = replica_a.merge(&replica_b);
        assert!(!merged.contains(&"x"));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut set = OrSet::new();
        set.add("x");
        set.add("y");
        set.remove(&"y");
        assert_eq!(set.merge(&set), set);
    }
}
