use super::{QueryResult, StateError, StateResult, Version, Versioned, WorldState};
use crate::selector::Selector;
use crate::validation::validate_state_key;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// A stored value and the number of writes it has seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Entry {
    pub(super) value: Vec<u8>,
    pub(super) version: Version,
}

pub(super) type Entries = BTreeMap<String, Entry>;

/// World state held in process memory.
///
/// Keys are kept ordered, so selector results come back in key order. The version check and
/// the insert in `put_state` happen under one write lock.
#[derive(Debug, Default)]
pub struct MemoryState {
    entries: RwLock<Entries>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> StateResult<usize> {
        let entries = self.entries.read().map_err(|_| StateError::Poisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> StateResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl WorldState for MemoryState {
    fn get_versioned(&self, key: &str) -> StateResult<Versioned> {
        validate_state_key(key)?;
        let entries = self.entries.read().map_err(|_| StateError::Poisoned)?;
        Ok(versioned(&entries, key))
    }

    fn put_state(&self, key: &str, value: Vec<u8>, expected: Version) -> StateResult<Version> {
        validate_state_key(key)?;
        let mut entries = self.entries.write().map_err(|_| StateError::Poisoned)?;
        insert_at(&mut entries, key, value, expected)
    }

    fn get_query_result(&self, selector: &Selector) -> StateResult<Vec<QueryResult>> {
        let entries = self.entries.read().map_err(|_| StateError::Poisoned)?;
        Ok(select(&entries, selector))
    }
}

pub(super) fn versioned(entries: &Entries, key: &str) -> Versioned {
    match entries.get(key) {
        Some(entry) => Versioned {
            value: Some(entry.value.clone()),
            version: entry.version,
        },
        None => Versioned::default(),
    }
}

/// Stores `value` under `key` if the key is still at `expected`, returning the new version.
pub(super) fn insert_at(
    entries: &mut Entries,
    key: &str,
    value: Vec<u8>,
    expected: Version,
) -> StateResult<Version> {
    let found = entries.get(key).map_or(0, |entry| entry.version);
    if found != expected {
        tracing::warn!(
            "rejected stale write to {}: expected version {}, found {}",
            key,
            expected,
            found
        );
        return Err(StateError::Conflict {
            key: key.to_owned(),
            expected,
            found,
        });
    }

    let version = found + 1;
    entries.insert(key.to_owned(), Entry { value, version });
    Ok(version)
}

/// Evaluates `selector` over every stored value that parses as a JSON document.
///
/// Values that are not JSON are invisible to selector queries, as in a document store.
pub(super) fn select(entries: &Entries, selector: &Selector) -> Vec<QueryResult> {
    entries
        .iter()
        .filter(|(_, entry)| {
            serde_json::from_slice::<serde_json::Value>(&entry.value)
                .map(|doc| selector.matches(&doc))
                .unwrap_or(false)
        })
        .map(|(key, entry)| QueryResult {
            key: key.clone(),
            value: entry.value.clone(),
        })
        .collect()
}
