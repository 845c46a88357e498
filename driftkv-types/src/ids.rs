//! Identifier types used throughout the driftkv core.
//!
//! Node identities are short human-assigned names ("A", "laptop", ...).
//! They key vector-clock counters and peer tables, and the rename protocol
//! moves state between them, so they are strings rather than opaque UUIDs.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The external name of a node in the cluster.
///
/// Used as the key for vector-clock counters and peer-table entries.
/// A rename rewrites this name everywhere it appears; see the identity
/// registry in the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a node ID, rejecting empty names.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::InvalidNodeId("name must not be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The shared secret carried by every wire message.
///
/// The transport layer compares it against the configured secret before a
/// message reaches the core; the core itself never inspects it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Creates a token from a secret string.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Checks a presented token against this one.
    #[must_use]
    pub fn verify(&self, presented: &AuthToken) -> bool {
        self == presented
    }
}

// The secret never appears in logs or debug output.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}
