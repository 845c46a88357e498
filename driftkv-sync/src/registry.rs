//! Node identities and the peer address table.
//!
//! The registry owns the local node's name and the table of peer
//! addresses. Renames rewrite both, and the engine applies the matching
//! clock rename under the same lock, so the peer table and the clock's
//! counter set never disagree about which identities exist.

use driftkv_types::NodeId;
use std::collections::HashMap;
use std::net::SocketAddr;

/// What a rename actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    /// True if the local identity was the one renamed.
    pub renamed_local: bool,
    /// The address moved from the old name to the new one, if any.
    pub moved_peer: Option<SocketAddr>,
}

/// The set of known node identities and where to reach them.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    local_id: NodeId,
    peers: HashMap<NodeId, SocketAddr>,
}

impl IdentityRegistry {
    /// Creates a registry for the local node with its initial peer table.
    #[must_use]
    pub fn new(local_id: NodeId, peers: HashMap<NodeId, SocketAddr>) -> Self {
        Self { local_id, peers }
    }

    /// The local node's current name.
    #[must_use]
    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    /// The address registered for a peer.
    #[must_use]
    pub fn addr_of(&self, id: &NodeId) -> Option<SocketAddr> {
        self.peers.get(id).copied()
    }

    /// All peers and their addresses.
    pub fn peers(&self) -> impl Iterator<Item = (&NodeId, SocketAddr)> {
        self.peers.iter().map(|(id, &addr)| (id, addr))
    }

    /// An owned copy of the peer table, for use after the state lock drops.
    #[must_use]
    pub fn peer_addrs(&self) -> Vec<(NodeId, SocketAddr)> {
        self.peers
            .iter()
            .map(|(id, &addr)| (id.clone(), addr))
            .collect()
    }

    /// Every identity this node knows of: itself plus all peers.
    pub fn known_ids(&self) -> impl Iterator<Item = &NodeId> {
        std::iter::once(&self.local_id).chain(self.peers.keys())
    }

    /// Number of peers in the table.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Adds a peer, or replaces its address if already present.
    pub fn add_peer(&mut self, id: NodeId, addr: SocketAddr) {
        self.peers.insert(id, addr);
    }

    /// Changes a known peer's address. Returns false if the peer is unknown.
    pub fn update_peer(&mut self, id: &NodeId, addr: SocketAddr) -> bool {
        match self.peers.get_mut(id) {
            Some(slot) => {
                *slot = addr;
                true
            }
            None => false,
        }
    }

    /// Removes a peer from the table.
    pub fn remove_peer(&mut self, id: &NodeId) -> Option<SocketAddr> {
        self.peers.remove(id)
    }

    /// Applies an identity rename to the table and, when `old` is the local
    /// identity, to the local name.
    ///
    /// An unknown `old` moves nothing; the clock side of the rename still
    /// creates the new identity at counter 0.
    pub fn rename(&mut self, old: &NodeId, new: &NodeId) -> RenameOutcome {
        let moved_peer = self.peers.remove(old);
        if let Some(addr) = moved_peer {
            self.peers.insert(new.clone(), addr);
        }
        let renamed_local = self.local_id == *old;
        if renamed_local {
            self.local_id = new.clone();
        }
        RenameOutcome {
            renamed_local,
            moved_peer,
        }
    }
}
