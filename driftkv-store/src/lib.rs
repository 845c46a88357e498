//! Replicated key-value map with causal conflict detection.
//!
//! [`KvStore`] holds one [`Entry`] (value + clock snapshot) per key and
//! applies the conflict-detection policy on every incoming write:
//!
//! - updates that are causally ahead are accepted,
//! - replays and stale updates are dropped without noise,
//! - genuinely concurrent updates surface as a [`Conflict`] that parks the
//!   key until someone calls [`KvStore::resolve`].
//!
//! A conflict is an outcome, not an error: the store never loses either
//! side of a concurrent write, it just refuses to pick a winner on its own.

mod conflict;
mod store;

pub use conflict::{Conflict, ConflictId, Resolution, ResolvedWrite};
pub use store::{Entry, KvStore, WriteOutcome};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key has an unresolved conflict and accepts no writes until
    /// [`KvStore::resolve`] is called.
    #[error("key '{key}' is blocked on unresolved conflict {conflict}")]
    KeyBlocked {
        /// The blocked key.
        key: String,
        /// The conflict that must be resolved first.
        conflict: ConflictId,
    },

    /// No pending conflict with the given id.
    #[error("unknown conflict: {0}")]
    UnknownConflict(ConflictId),
}
