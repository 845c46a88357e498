use driftkv_clock::{NodeClock, VectorClock};
use driftkv_store::{ConflictId, KvStore, Resolution, StoreError, WriteOutcome};
use driftkv_types::NodeId;
use pretty_assertions::assert_eq;

fn id(name: &str) -> NodeId {
    NodeId::from(name)
}

fn clock_of(pairs: &[(&str, u64)]) -> VectorClock {
    let mut clock = VectorClock::new();
    for (name, count) in pairs {
        let node = id(name);
        for _ in 0..*count {
            clock.tick(&node);
        }
    }
    clock
}

/// A store with a parked conflict on "k1": existing "y" vs incoming "x".
fn conflicted_store() -> (KvStore, NodeClock, driftkv_store::Conflict) {
    let mut store = KvStore::new();
    let mut clock = NodeClock::new(id("b"), [id("a")]);
    store.put_local("k1", "y", &mut clock).unwrap();

    let WriteOutcome::Conflict(conflict) =
        store.merge_write("k1", "x", clock_of(&[("a", 1)]), &mut clock)
    else {
        panic!("expected a conflict");
    };
    (store, clock, conflict)
}

// ── resolve ──────────────────────────────────────────────────────

#[test]
fn keep_existing_leaves_the_stored_entry() {
    let (mut store, _clock, conflict) = conflicted_store();

    let resolved = store.resolve(conflict.id, Resolution::KeepExisting).unwrap();

    assert_eq!(resolved.key, "k1");
    assert_eq!(resolved.entry.value, "y");
    assert_eq!(store.get("k1").unwrap().value, "y");
    assert_eq!(store.pending_conflicts().count(), 0);
}

#[test]
fn accept_incoming_replaces_the_entry() {
    let (mut store, _clock, conflict) = conflicted_store();

    let resolved = store.resolve(conflict.id, Resolution::AcceptIncoming).unwrap();

    assert_eq!(resolved.entry.value, "x");
    assert_eq!(resolved.entry.clock, clock_of(&[("a", 1)]));
    assert_eq!(store.get("k1").unwrap().value, "x");
    assert_eq!(store.pending_conflicts().count(), 0);
}

#[test]
fn resolution_unparks_the_key() {
    let (mut store, mut clock, conflict) = conflicted_store();
    store.resolve(conflict.id, Resolution::KeepExisting).unwrap();

    assert!(store.put_local("k1", "z", &mut clock).is_ok());
    assert_eq!(store.get("k1").unwrap().value, "z");
}

#[test]
fn resolving_twice_fails() {
    let (mut store, _clock, conflict) = conflicted_store();
    store.resolve(conflict.id, Resolution::KeepExisting).unwrap();

    let err = store
        .resolve(conflict.id, Resolution::AcceptIncoming)
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownConflict(_)));
}

#[test]
fn unknown_conflict_id_fails() {
    let mut store = KvStore::new();
    let err = store
        .resolve(ConflictId::new(), Resolution::KeepExisting)
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownConflict(_)));
}

#[test]
fn resolution_does_not_merge_the_clock() {
    let (mut store, clock, conflict) = conflicted_store();
    let clock_before = clock.snapshot();

    store.resolve(conflict.id, Resolution::AcceptIncoming).unwrap();

    // Terminal for this round: the node clock stays where it was.
    assert_eq!(clock.snapshot(), clock_before);
}

// ── apply_resolution (remote decision) ───────────────────────────

#[test]
fn remote_resolution_replaces_entry_and_clears_conflict() {
    let (mut store, _clock, _conflict) = conflicted_store();

    store.apply_resolution("k1", "x", clock_of(&[("a", 1)]));

    assert_eq!(store.get("k1").unwrap().value, "x");
    assert_eq!(store.pending_conflicts().count(), 0);
    assert!(store.conflict_for_key("k1").is_none());
}

#[test]
fn remote_resolution_on_clean_key_just_overwrites() {
    let mut store = KvStore::new();
    store.apply_resolution("k9", "settled", clock_of(&[("c", 3)]));
    assert_eq!(store.get("k9").unwrap().value, "settled");
}

// ── descriptors ──────────────────────────────────────────────────

#[test]
fn conflict_carries_both_versions_verbatim() {
    let (_store, _clock, conflict) = conflicted_store();

    assert_eq!(conflict.existing.value, "y");
    assert_eq!(conflict.existing.clock, clock_of(&[("a", 0), ("b", 1)]));
    assert_eq!(conflict.incoming.value, "x");
    assert_eq!(conflict.incoming.clock, clock_of(&[("a", 1)]));
}

#[test]
fn conflict_ids_are_unique() {
    let (_s1, _c1, first) = conflicted_store();
    let (_s2, _c2, second) = conflicted_store();
    assert_ne!(first.id, second.id);
}
