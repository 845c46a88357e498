//! Node configuration.
//!
//! One immutable struct constructed at startup and passed into the engine;
//! there is no process-wide mutable configuration. Loadable from a JSON
//! file of the shape
//!
//! ```json
//! {
//!   "id": "A",
//!   "listen": "0.0.0.0:5000",
//!   "peers": { "B": "192.168.1.11:5001", "C": "192.168.1.12:5002" },
//!   "token": "shared-secret"
//! }
//! ```

use crate::retry::RetryPolicy;
use crate::{SyncError, SyncResult};
use driftkv_types::{AuthToken, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

fn default_send_timeout_ms() -> u64 {
    3_000
}

/// Tunables for outbound delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Per-peer send timeout, in milliseconds.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Retry schedule for failed sends.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ReplicationConfig {
    /// The per-peer send timeout as a [`Duration`].
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Everything a node needs to come up: identity, addresses, secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// This node's name.
    pub id: NodeId,
    /// Address the listener binds to.
    pub listen: SocketAddr,
    /// Peer name → address table.
    #[serde(default)]
    pub peers: HashMap<NodeId, SocketAddr>,
    /// Shared secret stamped on every outbound message and required of
    /// every inbound one.
    pub token: AuthToken,
    /// Delivery tunables.
    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl NodeConfig {
    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
