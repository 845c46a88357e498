//! The replicated map and its merge-write policy.

use crate::conflict::{Conflict, ConflictId, Resolution, ResolvedWrite};
use crate::{StoreError, StoreResult};
use driftkv_clock::{CausalOrder, NodeClock, VectorClock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored version of a key: the value and the clock it was written at.
///
/// The clock is an immutable snapshot taken at write time; entries are
/// replaced wholesale, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque value payload.
    pub value: String,
    /// Vector clock at the moment of the write.
    pub clock: VectorClock,
}

impl Entry {
    /// Creates an entry.
    #[must_use]
    pub fn new(value: impl Into<String>, clock: VectorClock) -> Self {
        Self {
            value: value.into(),
            clock,
        }
    }
}

/// What `merge_write` did with an incoming update.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The entry was stored and the node clock merged.
    Applied,
    /// The incoming clock equals the stored one — a replay, ignored.
    Unchanged,
    /// The incoming clock is dominated by the stored one — dropped silently.
    Stale,
    /// Concurrent versions: the key is parked until the conflict resolves.
    Conflict(Conflict),
    /// The key was already parked on an earlier conflict; nothing applied.
    Blocked(ConflictId),
}

/// The replicated map of key → [`Entry`].
///
/// All mutation goes through [`KvStore::put_local`], [`KvStore::merge_write`],
/// and the resolution calls, so the conflict policy cannot be bypassed.
#[derive(Debug, Default)]
pub struct KvStore {
    entries: HashMap<String, Entry>,
    pending: HashMap<ConflictId, Conflict>,
    blocked: HashMap<String, ConflictId>,
}

impl KvStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a persisted or synced snapshot.
    #[must_use]
    pub fn from_snapshot(entries: HashMap<String, Entry>) -> Self {
        Self {
            entries,
            pending: HashMap::new(),
            blocked: HashMap::new(),
        }
    }

    /// Returns the entry for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Returns all keys and entries.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A full copy of the map, for sync responses and persistence.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Entry> {
        self.entries.clone()
    }

    /// Pending conflicts, in no particular order.
    pub fn pending_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.pending.values()
    }

    /// The unresolved conflict parked on a key, if any.
    #[must_use]
    pub fn conflict_for_key(&self, key: &str) -> Option<&Conflict> {
        self.blocked.get(key).and_then(|id| self.pending.get(id))
    }

    /// Records a local write.
    ///
    /// Ticks the node clock, stamps the entry with the new snapshot, and
    /// returns that snapshot for the outbound data message. Local writes
    /// never fail for network reasons; the only refusal is a key parked on
    /// an unresolved conflict.
    pub fn put_local(
        &mut self,
        key: &str,
        value: impl Into<String>,
        clock: &mut NodeClock,
    ) -> StoreResult<VectorClock> {
        if let Some(id) = self.blocked.get(key) {
            return Err(StoreError::KeyBlocked {
                key: key.to_string(),
                conflict: *id,
            });
        }
        clock.increment();
        let stamp = clock.snapshot();
        self.entries
            .insert(key.to_string(), Entry::new(value, stamp.clone()));
        Ok(stamp)
    }

    /// Applies an incoming replicated write.
    ///
    /// The decision runs on two comparisons: the node's own clock against
    /// the incoming clock (`rel1`), and the incoming clock against the
    /// stored entry's clock (`rel2`). The update is accepted when
    /// `rel1 == Before` or `rel2 == After`; an `Equal` `rel2` is a replay
    /// and a `Before` `rel2` is stale — both no-ops. Anything else is a
    /// concurrent write and parks the key behind a [`Conflict`].
    pub fn merge_write(
        &mut self,
        key: &str,
        value: impl Into<String>,
        incoming: VectorClock,
        clock: &mut NodeClock,
    ) -> WriteOutcome {
        if let Some(id) = self.blocked.get(key) {
            return WriteOutcome::Blocked(*id);
        }

        let Some(existing) = self.entries.get(key) else {
            // First version of this key: nothing to conflict with.
            clock.merge(&incoming);
            self.entries
                .insert(key.to_string(), Entry::new(value, incoming));
            return WriteOutcome::Applied;
        };

        match incoming.compare(&existing.clock) {
            CausalOrder::Equal => return WriteOutcome::Unchanged,
            CausalOrder::Before => return WriteOutcome::Stale,
            rel2 => {
                let rel1 = clock.vector().compare(&incoming);
                if rel1 == CausalOrder::Before || rel2 == CausalOrder::After {
                    clock.merge(&incoming);
                    self.entries
                        .insert(key.to_string(), Entry::new(value, incoming));
                    return WriteOutcome::Applied;
                }
            }
        }

        let conflict = Conflict {
            id: ConflictId::new(),
            key: key.to_string(),
            existing: self.entries[key].clone(),
            incoming: Entry::new(value, incoming),
        };
        self.blocked.insert(key.to_string(), conflict.id);
        self.pending.insert(conflict.id, conflict.clone());
        WriteOutcome::Conflict(conflict)
    }

    /// Completes a parked write with a decision.
    ///
    /// Terminal for that round: the chosen entry is stored as-is and no
    /// clock merge happens. Returns the winner so the caller can broadcast
    /// the resolution.
    pub fn resolve(&mut self, id: ConflictId, decision: Resolution) -> StoreResult<ResolvedWrite> {
        let conflict = self
            .pending
            .remove(&id)
            .ok_or(StoreError::UnknownConflict(id))?;
        self.blocked.remove(&conflict.key);

        let entry = match decision {
            Resolution::KeepExisting => conflict.existing,
            Resolution::AcceptIncoming => conflict.incoming,
        };
        self.entries.insert(conflict.key.clone(), entry.clone());
        Ok(ResolvedWrite {
            key: conflict.key,
            entry,
        })
    }

    /// Applies a resolution broadcast by another node.
    ///
    /// The carried entry replaces whatever is stored, and any conflict
    /// parked on the key is cleared — the cluster-wide decision supersedes
    /// the local one.
    pub fn apply_resolution(&mut self, key: &str, value: impl Into<String>, clock: VectorClock) {
        if let Some(id) = self.blocked.remove(key) {
            self.pending.remove(&id);
        }
        self.entries.insert(key.to_string(), Entry::new(value, clock));
    }
}
