//! A vector clock bound to its owning node.
//!
//! The invariant a vector clock depends on is that each node increments
//! only its own counter; everyone else's counters rise only through merge.
//! [`NodeClock`] enforces that by holding the owner identity next to the
//! vector and exposing increment without an identity parameter.

use crate::VectorClock;
use driftkv_types::NodeId;

/// The live clock of a running node.
#[derive(Debug, Clone)]
pub struct NodeClock {
    id: NodeId,
    vector: VectorClock,
}

impl NodeClock {
    /// Creates a clock for `id` with zero counters for every known identity.
    ///
    /// The owner is always included, whether or not it appears in `known`.
    pub fn new<I>(id: NodeId, known: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let vector = VectorClock::zeroed(known.into_iter().chain(std::iter::once(id.clone())));
        Self { id, vector }
    }

    /// Restores a clock from a persisted vector.
    #[must_use]
    pub fn restore(id: NodeId, vector: VectorClock) -> Self {
        Self { id, vector }
    }

    /// The identity that owns this clock.
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// A read-only view of the underlying vector.
    #[must_use]
    pub fn vector(&self) -> &VectorClock {
        &self.vector
    }

    /// An immutable copy of the vector, for stamping entries and messages.
    #[must_use]
    pub fn snapshot(&self) -> VectorClock {
        self.vector.clone()
    }

    /// Records a local event: raises the owner's counter by 1.
    pub fn increment(&mut self) -> u64 {
        self.vector.tick(&self.id)
    }

    /// Records an accepted remote event.
    ///
    /// Takes the pointwise maximum with the remote vector, then ticks the
    /// owner's counter. The trailing tick makes this non-idempotent:
    /// merging the same remote clock twice advances the owner twice.
    pub fn merge(&mut self, remote: &VectorClock) -> u64 {
        self.vector.merge(remote);
        self.increment()
    }

    /// Applies an identity rename to the vector, and to the owner identity
    /// if it matches `old`.
    pub fn rename(&mut self, old: &NodeId, new: &NodeId) {
        self.vector.rename(old, new);
        if self.id == *old {
            self.id = new.clone();
        }
    }
}
