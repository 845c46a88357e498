//! Core type definitions for driftkv.
//!
//! This crate defines the fundamental types shared by every layer of the
//! store:
//! - [`NodeId`] — the external name of a node, as used in vector clocks,
//!   peer tables, and wire messages
//! - [`AuthToken`] — the opaque shared secret carried by every message and
//!   checked at the transport boundary
//!
//! Node identities are deliberately plain strings rather than generated
//! UUIDs: the rename protocol rewrites them in place across the cluster,
//! so they must stay human-assignable.

mod ids;

pub use ids::{AuthToken, NodeId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),
}
