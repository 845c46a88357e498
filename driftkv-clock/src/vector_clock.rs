//! Vector clock for causality tracking.
//!
//! A vector clock carries one logical counter per node identity. Comparing
//! two clocks determines whether the events they stamp are causally ordered
//! or concurrent, which is what the store's conflict detection runs on.

use driftkv_types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Causality relationship between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    /// First clock happened before second.
    Before,
    /// First clock happened after second.
    After,
    /// Clocks are concurrent (neither happened before the other).
    Concurrent,
    /// Clocks are identical.
    Equal,
}

/// A vector clock: a map from node identity to a logical counter.
///
/// Identities absent from the map are treated as counter 0, so clocks with
/// different identity vocabularies still compare meaningfully.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    counters: HashMap<NodeId, u64>,
}

impl VectorClock {
    /// Creates a new empty vector clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    /// Creates a clock with a zero counter for every given identity.
    ///
    /// This is the shape a node starts with: all known identities present,
    /// nothing counted yet.
    #[must_use]
    pub fn zeroed<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self {
            counters: ids.into_iter().map(|id| (id, 0)).collect(),
        }
    }

    /// Returns the counter for an identity (0 if not present).
    #[must_use]
    pub fn get(&self, id: &NodeId) -> u64 {
        self.counters.get(id).copied().unwrap_or(0)
    }

    /// Returns all identities and their counters.
    pub fn entries(&self) -> impl Iterator<Item = (&NodeId, u64)> {
        self.counters.iter().map(|(id, &n)| (id, n))
    }

    /// Returns true if the clock tracks the given identity.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.counters.contains_key(id)
    }

    /// Returns the number of identities in the clock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns true if the clock has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Raises the counter for an identity by 1 and returns the new value.
    ///
    /// Creates the entry at 0 first if the identity is unknown.
    pub fn tick(&mut self, id: &NodeId) -> u64 {
        let entry = self.counters.entry(id.clone()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Merges another clock into this one, taking the pointwise maximum.
    ///
    /// Commutative, associative, and idempotent. Counters are never
    /// lowered.
    pub fn merge(&mut self, other: &Self) {
        for (id, &count) in &other.counters {
            let entry = self.counters.entry(id.clone()).or_insert(0);
            if count > *entry {
                *entry = count;
            }
        }
    }

    /// Returns a new clock that is the merge of this and another.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Compares this clock with another to determine causal ordering.
    ///
    /// Identities known to only one side count as 0 on the other.
    #[must_use]
    pub fn compare(&self, other: &Self) -> CausalOrder {
        let mut self_dominates = true; // self >= other for all identities
        let mut other_dominates = true; // other >= self for all identities

        let all_ids: HashSet<&NodeId> =
            self.counters.keys().chain(other.counters.keys()).collect();

        for id in all_ids {
            let ours = self.get(id);
            let theirs = other.get(id);
            if ours < theirs {
                self_dominates = false;
            }
            if theirs < ours {
                other_dominates = false;
            }
        }

        match (self_dominates, other_dominates) {
            (true, true) => CausalOrder::Equal,
            (true, false) => CausalOrder::After,
            (false, true) => CausalOrder::Before,
            (false, false) => CausalOrder::Concurrent,
        }
    }

    /// Returns true if this clock is causally before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Before
    }

    /// Returns true if this clock is causally after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::After
    }

    /// Returns true if this clock is concurrent with the other.
    #[must_use]
    pub fn is_concurrent(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Concurrent
    }

    /// Moves the counter stored under `old` to `new`, removing `old`.
    ///
    /// If `old` is absent, `new` is created at 0. If `new` already has a
    /// counter it is overwritten; every node must apply the same renames
    /// or clocks diverge in their identity vocabulary.
    pub fn rename(&mut self, old: &NodeId, new: &NodeId) {
        let count = self.counters.remove(old).unwrap_or(0);
        self.counters.insert(new.clone(), count);
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Equal
    }
}

impl Eq for VectorClock {}
