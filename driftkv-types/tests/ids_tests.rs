use driftkv_types::{AuthToken, NodeId};
use pretty_assertions::assert_eq;

// ── NodeId ───────────────────────────────────────────────────────

#[test]
fn node_id_displays_its_name() {
    let id = NodeId::new("laptop");
    assert_eq!(id.to_string(), "laptop");
    assert_eq!(id.as_str(), "laptop");
}

#[test]
fn node_id_parse_accepts_names() {
    let id = NodeId::parse("A").unwrap();
    assert_eq!(id, NodeId::from("A"));
}

#[test]
fn node_id_parse_rejects_empty() {
    assert!(NodeId::parse("").is_err());
    assert!(NodeId::parse("   ").is_err());
}

#[test]
fn node_id_from_str() {
    let id: NodeId = "B".parse().unwrap();
    assert_eq!(id.as_str(), "B");
}

#[test]
fn node_id_serializes_as_bare_string() {
    let id = NodeId::new("A");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"A\"");

    let parsed: NodeId = serde_json::from_str("\"A\"").unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn node_ids_order_by_name() {
    let mut ids = vec![NodeId::new("c"), NodeId::new("a"), NodeId::new("b")];
    ids.sort();
    assert_eq!(ids[0].as_str(), "a");
    assert_eq!(ids[2].as_str(), "c");
}

// ── AuthToken ────────────────────────────────────────────────────

#[test]
fn token_verifies_matching_secret() {
    let token = AuthToken::new("hunter2");
    assert!(token.verify(&AuthToken::new("hunter2")));
    assert!(!token.verify(&AuthToken::new("hunter3")));
}

#[test]
fn token_debug_never_reveals_the_secret() {
    let token = AuthToken::new("hunter2");
    let printed = format!("{token:?}");
    assert!(!printed.contains("hunter2"));
}

#[test]
fn token_serializes_as_bare_string() {
    let token = AuthToken::new("s3cret");
    assert_eq!(serde_json::to_string(&token).unwrap(), "\"s3cret\"");

    let parsed: AuthToken = serde_json::from_str("\"s3cret\"").unwrap();
    assert!(token.verify(&parsed));
}
