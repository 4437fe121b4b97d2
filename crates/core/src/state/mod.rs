//! The world-state seam.
//!
//! Every read and write performed by the record store goes through [`WorldState`]. The host
//! ledger provides the real implementation; this module also ships two in-process adapters:
//!
//! - [`MemoryState`]: an ordered map, used by the server by default and throughout the tests
//! - [`FileState`]: the same map persisted to a JSON snapshot, used by the CLI
//!
//! Writes are optimistic. Every key carries a [`Version`] that changes on each write, and
//! `put_state` only succeeds while the key is still at the version the caller read. A
//! conflicting concurrent write therefore surfaces as [`StateError::Conflict`] instead of
//! silently replacing the other writer's value.

mod memory;
mod snapshot;

pub use memory::MemoryState;
pub use snapshot::FileState;

use crate::selector::Selector;

/// One `(key, value)` pair returned by a selector query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResult {
    pub key: String,
    pub value: Vec<u8>,
}

/// Write counter of a single key. A key that has never been written is at version `0`.
pub type Version = u64;

/// The value stored under a key together with the version it was read at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Versioned {
    pub value: Option<Vec<u8>>,
    pub version: Version,
}

/// Transactional key-value access to the world state.
pub trait WorldState: Send + Sync {
    /// Returns the bytes stored under `key` and the version they were read at.
    fn get_versioned(&self, key: &str) -> StateResult<Versioned>;

    /// Returns the bytes stored under `key`, or `None` if nothing is stored there.
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.get_versioned(key)?.value)
    }

    /// Stores `value` under `key` if the key is still at version `expected`, returning the
    /// new version.
    ///
    /// Fails with [`StateError::Conflict`] when another write got there first.
    fn put_state(&self, key: &str, value: Vec<u8>, expected: Version) -> StateResult<Version>;

    /// Returns every stored document matched by `selector`.
    ///
    /// Result order is defined by the implementation.
    fn get_query_result(&self, selector: &Selector) -> StateResult<Vec<QueryResult>>;
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid state key: {0}")]
    InvalidKey(String),
    #[error("world state backend failure: {0}")]
    Backend(String),
    #[error("conflicting write to {key}: expected version {expected}, found {found}")]
    Conflict {
        key: String,
        expected: Version,
        found: Version,
    },
    #[error("world state lock poisoned")]
    Poisoned,
    #[error("failed to read state snapshot: {0}")]
    SnapshotRead(std::io::Error),
    #[error("failed to write state snapshot: {0}")]
    SnapshotWrite(std::io::Error),
    #[error("state snapshot is corrupt: {0}")]
    SnapshotCorrupt(String),
    #[error("failed to serialize state snapshot: {0}")]
    SnapshotSerialization(serde_json::Error),
}

pub type StateResult<T> = std::result::Result<T, StateError>;
