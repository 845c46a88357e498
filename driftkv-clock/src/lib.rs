//! Vector-clock causality tracking for driftkv.
//!
//! This crate provides the logical-clock algebra the replicated store is
//! built on:
//!
//! - [`VectorClock`] — a pure counter vector (node id → count) with merge,
//!   comparison, and identity rename
//! - [`CausalOrder`] — the outcome of comparing two clocks
//! - [`NodeClock`] — a vector clock bound to the node that owns it, which
//!   is the only identity it may increment
//!
//! The merge step of [`VectorClock::merge`] is commutative, associative,
//! and idempotent. [`NodeClock::merge`] additionally ticks the owner's
//! counter after merging (a received message is itself an event), so it is
//! deliberately *not* idempotent — replaying the same remote clock twice
//! advances the owner's counter twice. Deduplication of replayed updates is
//! the store's job, via the `Equal` comparison branch.

mod node_clock;
mod vector_clock;

pub use node_clock::NodeClock;
pub use vector_clock::{CausalOrder, VectorClock};
