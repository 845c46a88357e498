//! The replication engine.
//!
//! [`Replicator`] owns the node's clock, store, and identity registry
//! behind a single mutex — conflict detection reads the store and the
//! clock together, so they move as one. Outbound sends always happen after
//! the lock is released; a slow peer never blocks local writes or other
//! inbound traffic.
//!
//! Everything observable — conflicts, applied writes, renames, delivery
//! failures — flows out through an event channel. Network failures are
//! absorbed here: a local `set` succeeds whether or not any peer is
//! reachable.

use crate::config::{NodeConfig, ReplicationConfig};
use crate::error::{SyncError, SyncResult};
use crate::persist::PersistedState;
use crate::protocol::{Envelope, Message};
use crate::registry::IdentityRegistry;
use crate::retry::RetryPolicy;
use crate::transport::Transport;
use driftkv_clock::{NodeClock, VectorClock};
use driftkv_store::{Conflict, ConflictId, Entry, KvStore, Resolution, WriteOutcome};
use driftkv_types::{AuthToken, NodeId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Observable outcomes surfaced by the engine.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A replicated write was accepted into the store.
    EntryApplied {
        /// The written key.
        key: String,
        /// The node that produced the write.
        sender: NodeId,
    },
    /// A concurrent write was detected; the key is parked until resolved.
    ConflictDetected(Conflict),
    /// A local decision completed a parked write.
    ConflictResolved {
        /// The key the conflict was on.
        key: String,
        /// The decision taken.
        decision: Resolution,
    },
    /// A remote node's decision was applied.
    ResolutionApplied {
        /// The key the conflict was on.
        key: String,
        /// The node that decided.
        sender: NodeId,
    },
    /// An identity rename was applied.
    PeerRenamed {
        /// The retired name.
        old: NodeId,
        /// The new name.
        new: NodeId,
    },
    /// A message could not be delivered within the retry budget.
    DeliveryFailed {
        /// The peer that was unreachable.
        peer: NodeId,
        /// The address tried.
        addr: SocketAddr,
        /// How many attempts were made.
        attempts: u32,
    },
}

/// The single serialization domain: clock, store, and identities move
/// together or not at all.
struct CoreState {
    clock: NodeClock,
    store: KvStore,
    registry: IdentityRegistry,
}

/// The replication engine for one node.
pub struct Replicator<T: Transport> {
    config: ReplicationConfig,
    token: AuthToken,
    state: Mutex<CoreState>,
    transport: Arc<T>,
    events: mpsc::UnboundedSender<NodeEvent>,
}

impl<T: Transport> Replicator<T> {
    /// Builds the engine from its configuration, optionally restoring a
    /// previously saved state. Returns the engine and the receiving end of
    /// its event channel.
    pub fn new(
        config: NodeConfig,
        restored: Option<PersistedState>,
        transport: Arc<T>,
    ) -> (Self, mpsc::UnboundedReceiver<NodeEvent>) {
        let registry = IdentityRegistry::new(config.id.clone(), config.peers.clone());
        let (clock, store) = match restored {
            Some(state) => (
                NodeClock::restore(config.id.clone(), state.clock),
                KvStore::from_snapshot(state.store),
            ),
            None => (
                NodeClock::new(config.id.clone(), config.peers.keys().cloned()),
                KvStore::new(),
            ),
        };

        let (events, events_rx) = mpsc::unbounded_channel();
        let engine = Self {
            config: config.replication,
            token: config.token,
            state: Mutex::new(CoreState {
                clock,
                store,
                registry,
            }),
            transport,
            events,
        };
        (engine, events_rx)
    }

    /// The shared secret the transport gate checks inbound messages with.
    #[must_use]
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    // ── Local operations ─────────────────────────────────────────

    /// Writes a key locally and replicates it to every peer.
    ///
    /// Always succeeds regardless of peer reachability; the only refusal
    /// is a key parked on an unresolved conflict.
    pub async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        let (stamp, sender, targets) = {
            let mut st = self.state.lock().await;
            let CoreState {
                clock,
                store,
                registry,
            } = &mut *st;
            let stamp = store.put_local(key, value, clock)?;
            (stamp, registry.local_id().clone(), registry.peer_addrs())
        };

        debug!(%key, "local write");
        self.broadcast(
            Message::Data {
                sender,
                clock: stamp,
                key: key.to_string(),
                value: value.to_string(),
            },
            targets,
        );
        Ok(())
    }

    /// Reads a value.
    pub async fn get(&self, key: &str) -> Option<String> {
        let st = self.state.lock().await;
        st.store.get(key).map(|e| e.value.clone())
    }

    /// A full copy of the store.
    pub async fn entries(&self) -> HashMap<String, Entry> {
        self.state.lock().await.store.snapshot()
    }

    /// Renames this node and announces the rename to every peer.
    pub async fn rename(&self, new_id: NodeId) {
        let (old, targets) = {
            let mut st = self.state.lock().await;
            let old = st.registry.local_id().clone();
            if old == new_id {
                return;
            }
            st.registry.rename(&old, &new_id);
            st.clock.rename(&old, &new_id);
            (old, st.registry.peer_addrs())
        };

        info!(%old, %new_id, "local node renamed");
        self.broadcast(
            Message::Rename {
                old_id: old,
                new_id,
            },
            targets,
        );
    }

    /// Completes a parked conflict and broadcasts the decision.
    pub async fn resolve(&self, id: ConflictId, decision: Resolution) -> SyncResult<()> {
        let (resolved, sender, targets) = {
            let mut st = self.state.lock().await;
            let resolved = st.store.resolve(id, decision)?;
            (resolved, st.registry.local_id().clone(), st.registry.peer_addrs())
        };

        info!(key = %resolved.key, conflict = %id, ?decision, "conflict resolved");
        self.emit(NodeEvent::ConflictResolved {
            key: resolved.key.clone(),
            decision,
        });
        self.broadcast(
            Message::ConflictResolution {
                sender,
                key: resolved.key,
                value: resolved.entry.value,
                clock: resolved.entry.clock,
            },
            targets,
        );
        Ok(())
    }

    /// Conflicts awaiting a decision.
    pub async fn pending_conflicts(&self) -> Vec<Conflict> {
        let st = self.state.lock().await;
        st.store.pending_conflicts().cloned().collect()
    }

    // ── Peer table ───────────────────────────────────────────────

    /// Adds a peer or replaces its address.
    pub async fn add_peer(&self, id: NodeId, addr: SocketAddr) {
        self.state.lock().await.registry.add_peer(id, addr);
    }

    /// Changes a known peer's address. Returns false if unknown.
    pub async fn update_peer(&self, id: &NodeId, addr: SocketAddr) -> bool {
        self.state.lock().await.registry.update_peer(id, addr)
    }

    /// Removes a peer from the table.
    pub async fn remove_peer(&self, id: &NodeId) -> Option<SocketAddr> {
        self.state.lock().await.registry.remove_peer(id)
    }

    /// The current peer table.
    pub async fn peers(&self) -> Vec<(NodeId, SocketAddr)> {
        self.state.lock().await.registry.peer_addrs()
    }

    /// This node's current name.
    pub async fn local_id(&self) -> NodeId {
        self.state.lock().await.registry.local_id().clone()
    }

    /// A snapshot of this node's clock vector.
    pub async fn clock(&self) -> VectorClock {
        self.state.lock().await.clock.snapshot()
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Asks every peer for its full store.
    pub async fn request_sync(&self) {
        let (sender, targets) = {
            let st = self.state.lock().await;
            (st.registry.local_id().clone(), st.registry.peer_addrs())
        };
        info!(peers = targets.len(), "requesting sync");
        self.broadcast(Message::SyncRequest { sender }, targets);
    }

    /// Asks one peer for its full store.
    pub async fn request_sync_from(&self, peer: &NodeId) -> SyncResult<()> {
        let (sender, addr) = {
            let st = self.state.lock().await;
            (st.registry.local_id().clone(), st.registry.addr_of(peer))
        };
        let addr = addr.ok_or_else(|| SyncError::PeerNotFound(peer.clone()))?;
        self.spawn_send(
            peer.clone(),
            addr,
            Envelope::new(self.token.clone(), Message::SyncRequest { sender }),
        );
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────

    /// The state to hand to a [`crate::persist::StateStore`].
    pub async fn persisted_state(&self) -> PersistedState {
        let st = self.state.lock().await;
        PersistedState {
            clock: st.clock.snapshot(),
            store: st.store.snapshot(),
        }
    }

    // ── Inbound ──────────────────────────────────────────────────

    /// Routes one authenticated, parsed message.
    ///
    /// Never fails: every error class is either logged and dropped or
    /// surfaced as a [`NodeEvent`].
    pub async fn dispatch(&self, message: Message) {
        debug!(kind = message.kind(), "dispatching message");
        match message {
            Message::Data {
                sender,
                clock,
                key,
                value,
            } => {
                self.apply_data(sender, clock, key, value).await;
            }

            Message::Rename { old_id, new_id } => {
                {
                    let mut st = self.state.lock().await;
                    st.registry.rename(&old_id, &new_id);
                    st.clock.rename(&old_id, &new_id);
                }
                info!(%old_id, %new_id, "peer renamed");
                self.emit(NodeEvent::PeerRenamed {
                    old: old_id,
                    new: new_id,
                });
            }

            Message::ConflictResolution {
                sender,
                key,
                value,
                clock,
            } => {
                {
                    let mut st = self.state.lock().await;
                    st.store.apply_resolution(&key, value, clock);
                }
                info!(%key, %sender, "remote conflict resolution applied");
                self.emit(NodeEvent::ResolutionApplied { key, sender });
            }

            Message::SyncRequest { sender } => {
                let (reply, addr) = {
                    let st = self.state.lock().await;
                    let reply = Message::SyncResponse {
                        sender: st.registry.local_id().clone(),
                        data: st.store.snapshot(),
                    };
                    (reply, st.registry.addr_of(&sender))
                };
                match addr {
                    Some(addr) => {
                        debug!(%sender, "answering sync request");
                        self.spawn_send(sender, addr, Envelope::new(self.token.clone(), reply));
                    }
                    None => warn!(%sender, "sync request from unknown peer dropped"),
                }
            }

            Message::SyncResponse { sender, data } => {
                info!(%sender, entries = data.len(), "applying sync response");
                for (key, entry) in data {
                    self.apply_data(sender.clone(), entry.clock, key, entry.value)
                        .await;
                }
            }
        }
    }

    /// Applies one replicated write; sync-response entries come through
    /// here too, so conflicts are raised identically.
    async fn apply_data(&self, sender: NodeId, clock: VectorClock, key: String, value: String) {
        let outcome = {
            let mut st = self.state.lock().await;
            let CoreState {
                clock: local, store, ..
            } = &mut *st;
            store.merge_write(&key, value, clock, local)
        };

        match outcome {
            WriteOutcome::Applied => {
                debug!(%key, %sender, "replicated write applied");
                self.emit(NodeEvent::EntryApplied { key, sender });
            }
            WriteOutcome::Unchanged => debug!(%key, %sender, "duplicate write ignored"),
            WriteOutcome::Stale => debug!(%key, %sender, "stale write dropped"),
            WriteOutcome::Conflict(conflict) => {
                warn!(
                    key = %conflict.key,
                    %sender,
                    conflict = %conflict.id,
                    "concurrent write detected"
                );
                self.emit(NodeEvent::ConflictDetected(conflict));
            }
            WriteOutcome::Blocked(id) => {
                warn!(%key, %sender, conflict = %id, "write deferred behind unresolved conflict");
            }
        }
    }

    // ── Outbound ─────────────────────────────────────────────────

    /// Sends a message to every peer independently. Fire-and-forget:
    /// returns as soon as the per-peer tasks are spawned.
    fn broadcast(&self, message: Message, targets: Vec<(NodeId, SocketAddr)>) {
        let envelope = Envelope::new(self.token.clone(), message);
        for (peer, addr) in targets {
            self.spawn_send(peer, addr, envelope.clone());
        }
    }

    fn spawn_send(&self, peer: NodeId, addr: SocketAddr, envelope: Envelope) {
        let transport = self.transport.clone();
        let retry = self.config.retry.clone();
        let timeout = self.config.send_timeout();
        let events = self.events.clone();
        tokio::spawn(async move {
            deliver_with_retry(transport, retry, timeout, peer, addr, envelope, events).await;
        });
    }

    fn emit(&self, event: NodeEvent) {
        // A dropped receiver just means nobody is watching.
        let _ = self.events.send(event);
    }
}

/// One delivery attempt sequence for one peer. Each failure is logged;
/// exhausting the policy produces a [`NodeEvent::DeliveryFailed`], never an
/// error for the write path.
async fn deliver_with_retry<T: Transport>(
    transport: Arc<T>,
    retry: RetryPolicy,
    timeout: Duration,
    peer: NodeId,
    addr: SocketAddr,
    envelope: Envelope,
    events: mpsc::UnboundedSender<NodeEvent>,
) {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match tokio::time::timeout(timeout, transport.deliver(addr, &envelope)).await {
            Ok(Ok(())) => {
                debug!(%peer, %addr, attempts, "delivered");
                return;
            }
            Ok(Err(e)) => warn!(%peer, %addr, attempts, "delivery failed: {e}"),
            Err(_) => warn!(%peer, %addr, attempts, "delivery timed out"),
        }

        if !retry.should_retry(attempts) {
            let _ = events.send(NodeEvent::DeliveryFailed {
                peer,
                addr,
                attempts,
            });
            return;
        }
        tokio::time::sleep(retry.delay_after(attempts)).await;
    }
}
