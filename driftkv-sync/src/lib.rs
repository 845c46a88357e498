//! Replication engine for driftkv.
//!
//! Moves updates between nodes without losing causal information. Each
//! node accepts local writes, stamps them with its vector clock, and
//! gossips them to every peer; incoming writes run through the store's
//! conflict detection and genuinely concurrent versions surface as events
//! awaiting an explicit decision.
//!
//! # Architecture
//!
//! - **Protocol** — the tagged-union wire messages and the authenticated
//!   envelope around them
//! - **Registry** — the local identity and the peer address table, kept
//!   consistent with the clock's counter set across renames
//! - **Engine** — [`Replicator`]: one mutex over clock + store + registry,
//!   exhaustive dispatch, fire-and-forget broadcast with bounded retry
//! - **Transport** — the [`Transport`] trait, a TCP implementation
//!   (one JSON envelope per connection), and a mock for tests
//! - **Persist** — the `{clock, store}` shape saved across restarts
//!
//! # Guarantees and non-guarantees
//!
//! Causal ordering only: updates that are causally related apply in order,
//! concurrent updates surface as conflicts. There is no consensus, no
//! leader, and no linearizability. Renames are broadcast best-effort with
//! no acknowledgment; a peer that misses one will disagree about identity
//! names until operators reconcile by hand.

pub mod config;
mod engine;
mod error;
pub mod persist;
pub mod protocol;
pub mod registry;
pub mod retry;
pub mod tcp;
pub mod transport;

pub use config::{NodeConfig, ReplicationConfig};
pub use engine::{NodeEvent, Replicator};
pub use error::{SyncError, SyncResult};
pub use persist::{JsonFileStore, PersistError, PersistResult, PersistedState, StateStore};
pub use protocol::{Envelope, Message};
pub use registry::{IdentityRegistry, RenameOutcome};
pub use retry::RetryPolicy;
pub use tcp::{serve, TcpTransport};
pub use transport::Transport;
