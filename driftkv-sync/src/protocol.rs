//! Replication protocol messages.
//!
//! Every message travels inside an [`Envelope`] carrying the shared-secret
//! token. The transport verifies the token and hands the bare [`Message`]
//! to dispatch; the core never sees credentials.
//!
//! The wire encoding is internally-tagged JSON with the envelope flattened
//! around it, so a data message reads
//! `{"token": "...", "kind": "data", "sender": "A", ...}` — one flat object
//! per message, matching the table in the protocol description.

use driftkv_clock::VectorClock;
use driftkv_store::Entry;
use driftkv_types::{AuthToken, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A replication message, dispatched exhaustively by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// A single replicated write.
    Data {
        /// The node that produced the write.
        sender: NodeId,
        /// Clock snapshot at write time.
        clock: VectorClock,
        /// The written key.
        key: String,
        /// The written value.
        value: String,
    },

    /// Announcement that a node changed its external name.
    Rename {
        /// The name being retired.
        old_id: NodeId,
        /// The name replacing it.
        new_id: NodeId,
    },

    /// The terminal decision for a previously surfaced conflict.
    ConflictResolution {
        /// The node that resolved the conflict.
        sender: NodeId,
        /// The contested key.
        key: String,
        /// The winning value.
        value: String,
        /// The winning clock snapshot.
        clock: VectorClock,
    },

    /// Ask a peer for its full store.
    SyncRequest {
        /// The requesting node.
        sender: NodeId,
    },

    /// Full-store answer to a [`Message::SyncRequest`].
    SyncResponse {
        /// The responding node.
        sender: NodeId,
        /// Every key the responder holds, with its clock snapshot.
        data: HashMap<String, Entry>,
    },
}

impl Message {
    /// The wire kind tag, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Data { .. } => "data",
            Message::Rename { .. } => "rename",
            Message::ConflictResolution { .. } => "conflict_resolution",
            Message::SyncRequest { .. } => "sync_request",
            Message::SyncResponse { .. } => "sync_response",
        }
    }
}

/// A message plus the authentication token the transport gate checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Shared secret, validated before dispatch.
    pub token: AuthToken,
    /// The payload.
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    /// Wraps a message with a token.
    #[must_use]
    pub fn new(token: AuthToken, message: Message) -> Self {
        Self { token, message }
    }
}
