//! Logical time: Lamport counters and vector clocks
//!
//! Gossip payloads carry a [`LogicalStamp`]; the merge engine uses
//! [`VectorClock::compare`] to sequence causally related updates and merge
//! concurrent ones. Vector clocks are keyed by [`InstanceId`] in a
//! `BTreeMap` so iteration and serialization are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::identifiers::InstanceId;

/// Scalar Lamport counter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct LamportClock(pub u64);

impl LamportClock {
    /// Advance for a local event
    pub fn tick(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Advance past a remote observation
    pub fn observe(&mut self, remote: u64) -> u64 {
        self.0 = self.0.max(remote) + 1;
        self.0
    }

    /// Current counter value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Result of comparing two vector clocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockOrdering {
    /// Left happened before right
    Before,
    /// Left happened after right
    After,
    /// Componentwise identical
    Equal,
    /// Causally incomparable
    Concurrent,
}

/// Partial map from instance to event counter
///
/// Missing entries count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VectorClock(BTreeMap<InstanceId, u64>);

impl VectorClock {
    /// Empty clock
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Counter for an instance (0 if absent)
    pub fn get(&self, instance: &InstanceId) -> u64 {
        self.0.get(instance).copied().unwrap_or(0)
    }

    /// Set an instance's slot
    pub fn insert(&mut self, instance: InstanceId, counter: u64) {
        self.0.insert(instance, counter);
    }

    /// Increment an instance's slot, returning the new value
    pub fn increment(&mut self, instance: &InstanceId) -> u64 {
        let slot = self.0.entry(instance.clone()).or_insert(0);
        *slot += 1;
        *slot
    }

    /// Elementwise maximum with another clock
    pub fn merge_max(&mut self, other: &VectorClock) {
        for (instance, &counter) in &other.0 {
            let slot = self.0.entry(instance.clone()).or_insert(0);
            *slot = (*slot).max(counter);
        }
    }

    /// Number of instances with a nonzero slot
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no events have been recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Causal comparison
    ///
    /// `Before` iff every component is ≤ the other's and at least one is
    /// strictly less; symmetric for `After`; `Equal` iff componentwise
    /// equal; otherwise `Concurrent`.
    pub fn compare(&self, other: &VectorClock) -> ClockOrdering {
        let mut less = false;
        let mut greater = false;

        for instance in self.0.keys().chain(other.0.keys()) {
            let a = self.get(instance);
            let b = other.get(instance);
            if a < b {
                less = true;
            } else if a > b {
                greater = true;
            }
            if less && greater {
                return ClockOrdering::Concurrent;
            }
        }

        match (less, greater) {
            (false, false) => ClockOrdering::Equal,
            (true, false) => ClockOrdering::Before,
            (false, true) => ClockOrdering::After,
            (true, true) => ClockOrdering::Concurrent,
        }
    }
}

/// A point in logical time, carried with replicated payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalStamp {
    /// Lamport counter at emission
    pub lamport: u64,
    /// Emitting instance's vector clock at emission
    pub vector: VectorClock,
}

/// Per-instance clock state combining Lamport and vector time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceClock {
    owner: InstanceId,
    lamport: LamportClock,
    vector: VectorClock,
}

impl InstanceClock {
    /// Create the clock for an instance
    pub fn new(owner: InstanceId) -> Self {
        Self {
            owner,
            lamport: LamportClock::default(),
            vector: VectorClock::new(),
        }
    }

    /// The owning instance
    pub fn owner(&self) -> &InstanceId {
        &self.owner
    }

    /// Record a local event and stamp it
    pub fn tick(&mut self) -> LogicalStamp {
        self.lamport.tick();
        self.vector.increment(&self.owner.clone());
        self.stamp()
    }

    /// Merge a remote stamp into local time
    ///
    /// Lamport becomes `max(local, remote) + 1`; the vector takes the
    /// elementwise max and then advances the local slot, so the receive
    /// itself is an event.
    pub fn observe(&mut self, remote: &LogicalStamp) -> LogicalStamp {
        self.lamport.observe(remote.lamport);
        self.vector.merge_max(&remote.vector);
        self.vector.increment(&self.owner.clone());
        self.stamp()
    }

    /// Current stamp without advancing
    pub fn stamp(&self) -> LogicalStamp {
        LogicalStamp {
            lamport: self.lamport.value(),
            vector: self.vector.clone(),
        }
    }
}
