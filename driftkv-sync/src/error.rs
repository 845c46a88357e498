//! Error types for the replication layer.

use driftkv_store::StoreError;
use driftkv_types::NodeId;
use thiserror::Error;

/// Result type for replication operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in replication operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store-level refusal (blocked key, unknown conflict).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No peer-table entry for the identity.
    #[error("peer not found: {0}")]
    PeerNotFound(NodeId),

    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),
}
