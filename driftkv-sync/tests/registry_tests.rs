use driftkv_sync::IdentityRegistry;
use driftkv_types::NodeId;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::net::SocketAddr;

fn id(name: &str) -> NodeId {
    NodeId::from(name)
}

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

fn registry() -> IdentityRegistry {
    let mut peers = HashMap::new();
    peers.insert(id("B"), addr(5001));
    peers.insert(id("C"), addr(5002));
    IdentityRegistry::new(id("A"), peers)
}

// ── Peer table ───────────────────────────────────────────────────

#[test]
fn knows_its_peers() {
    let registry = registry();
    assert_eq!(registry.local_id(), &id("A"));
    assert_eq!(registry.peer_count(), 2);
    assert_eq!(registry.addr_of(&id("B")), Some(addr(5001)));
    assert_eq!(registry.addr_of(&id("Z")), None);
}

#[test]
fn known_ids_include_self_and_peers() {
    let registry = registry();
    let mut ids: Vec<_> = registry.known_ids().cloned().collect();
    ids.sort();
    assert_eq!(ids, vec![id("A"), id("B"), id("C")]);
}

#[test]
fn add_peer_inserts_or_replaces() {
    let mut registry = registry();
    registry.add_peer(id("D"), addr(5003));
    assert_eq!(registry.addr_of(&id("D")), Some(addr(5003)));

    registry.add_peer(id("D"), addr(5004));
    assert_eq!(registry.addr_of(&id("D")), Some(addr(5004)));
    assert_eq!(registry.peer_count(), 3);
}

#[test]
fn update_peer_requires_existing_entry() {
    let mut registry = registry();
    assert!(registry.update_peer(&id("B"), addr(6001)));
    assert_eq!(registry.addr_of(&id("B")), Some(addr(6001)));

    assert!(!registry.update_peer(&id("Z"), addr(6002)));
    assert_eq!(registry.addr_of(&id("Z")), None);
}

#[test]
fn remove_peer_returns_the_address() {
    let mut registry = registry();
    assert_eq!(registry.remove_peer(&id("B")), Some(addr(5001)));
    assert_eq!(registry.remove_peer(&id("B")), None);
    assert_eq!(registry.peer_count(), 1);
}

// ── Rename ───────────────────────────────────────────────────────

#[test]
fn rename_moves_the_peer_entry() {
    let mut registry = registry();
    let outcome = registry.rename(&id("B"), &id("B2"));

    assert!(!outcome.renamed_local);
    assert_eq!(outcome.moved_peer, Some(addr(5001)));
    assert_eq!(registry.addr_of(&id("B")), None);
    assert_eq!(registry.addr_of(&id("B2")), Some(addr(5001)));
    assert_eq!(registry.peer_count(), 2);
}

#[test]
fn rename_of_local_identity_rewrites_it() {
    let mut registry = registry();
    let outcome = registry.rename(&id("A"), &id("A2"));

    assert!(outcome.renamed_local);
    assert_eq!(outcome.moved_peer, None);
    assert_eq!(registry.local_id(), &id("A2"));
    // Peer table untouched.
    assert_eq!(registry.peer_count(), 2);
}

#[test]
fn rename_of_unknown_identity_moves_nothing() {
    let mut registry = registry();
    let outcome = registry.rename(&id("ghost"), &id("g2"));

    assert!(!outcome.renamed_local);
    assert_eq!(outcome.moved_peer, None);
    assert_eq!(registry.local_id(), &id("A"));
    assert_eq!(registry.peer_count(), 2);
}
