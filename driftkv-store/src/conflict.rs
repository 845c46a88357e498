//! Conflict descriptors and the resolution contract.
//!
//! When `merge_write` finds two concurrent versions of a key it returns a
//! [`Conflict`] carrying both sides and parks the key. The caller decides —
//! in its own time, there is no deadline — and completes the write with
//! [`Resolution::KeepExisting`] or [`Resolution::AcceptIncoming`].

use crate::store::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a pending conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(Uuid);

impl ConflictId {
    /// Creates a new conflict ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConflictId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConflictId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An unresolved concurrent write: both versions of the key, side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Identifier to resolve this conflict by.
    pub id: ConflictId,
    /// The contested key.
    pub key: String,
    /// What the store currently holds.
    pub existing: Entry,
    /// What the remote update carried.
    pub incoming: Entry,
}

/// The decision that completes a parked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Keep the entry already in the store.
    KeepExisting,
    /// Replace it with the incoming entry.
    AcceptIncoming,
}

/// The outcome of a resolution: the winning entry, ready to broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWrite {
    /// The key the conflict was on.
    pub key: String,
    /// The entry now stored under the key.
    pub entry: Entry,
}
