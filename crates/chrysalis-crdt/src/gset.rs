//! Grow-only set

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::Merge;

/// A grow-only set; merge is set union
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GSet<T: Ord>(BTreeSet<T>);

impl<T: Ord + Clone> GSet<T> {
    /// Empty set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add an element; removal is not expressible
    pub fn insert(&mut self, value: T) {
        self.0.insert(value);
    }

    /// Membership test
    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate elements in order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Ord + Clone> Merge for GSet<T> {
    fn merge(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl<T: Ord + Clone> FromIterator<T> for GSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
