//! Persisted node state.
//!
//! The core owns the shape — the clock vector and the full store map — and
//! a [`StateStore`] collaborator owns where it lives. Loading happens once
//! at startup, saving on demand; there is no write-through.

use driftkv_clock::VectorClock;
use driftkv_store::Entry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Errors while loading or saving state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file did not parse.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything a node carries across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    /// The node's clock vector at save time.
    pub clock: VectorClock,
    /// The full key → entry map.
    pub store: HashMap<String, Entry>,
}

/// Loads and saves [`PersistedState`].
pub trait StateStore: Send + Sync {
    /// Reads the saved state, or `None` if nothing was ever saved.
    fn load(&self) -> PersistResult<Option<PersistedState>>;

    /// Writes the state, replacing any previous save.
    fn save(&self, state: &PersistedState) -> PersistResult<()>;
}

/// State persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> PersistResult<Option<PersistedState>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn save(&self, state: &PersistedState) -> PersistResult<()> {
        let raw = serde_json::to_vec_pretty(state)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
