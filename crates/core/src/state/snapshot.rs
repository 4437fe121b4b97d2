//! World state persisted as a JSON snapshot file.
//!
//! ## File Layout
//!
//! ```text
//! {
//!   "version": 2,
//!   "entries": {
//!     "P001": { "value": "eyJpZCI6IlAwMDEiLCJuYW1lIjoiQWRhIn0=", "version": 3 },
//!     ...
//!   }
//! }
//! ```
//!
//! Values are base64-encoded so that arbitrary bytes survive the round trip, and each entry
//! keeps its write version so that stale writers are detected across processes.
//!
//! ## Writes
//!
//! Every put takes an exclusive advisory lock on `<snapshot>.lock`, re-reads the snapshot from
//! disk, applies the version check against what is on disk, and rewrites the whole file
//! through a uniquely named temp file that is renamed into place. Another handle's or
//! process's writes are therefore merged rather than overwritten. The in-memory copy only
//! changes once the new snapshot is on disk.
//!
//! Reads are served from the copy loaded at open and refreshed on each write. A read that has
//! gone stale is caught by the version check when its result is written back.

use super::memory::{insert_at, select, versioned, Entries, Entry};
use super::{QueryResult, StateError, StateResult, Version, Versioned, WorldState};
use crate::constants::SNAPSHOT_FORMAT_VERSION;
use crate::selector::Selector;
use crate::validation::validate_state_key;
use base64::{engine::general_purpose, Engine as _};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Serialize, Deserialize)]
struct SnapshotWire {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, EntryWire>,
}

#[derive(Serialize, Deserialize)]
struct EntryWire {
    value: String,
    version: Version,
}

/// File-backed world state.
#[derive(Debug)]
pub struct FileState {
    path: PathBuf,
    lock_path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileState {
    /// Opens the snapshot at `path`, starting empty if the file does not exist yet.
    ///
    /// The file is not created until the first write.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if:
    /// - the file exists but cannot be read ([`StateError::SnapshotRead`])
    /// - the contents are not a snapshot of a supported version, or a value is not valid
    ///   base64 ([`StateError::SnapshotCorrupt`])
    pub fn open(path: impl Into<PathBuf>) -> StateResult<Self> {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        let state = Self {
            lock_path: PathBuf::from(lock_path),
            entries: Mutex::new(read_snapshot(&path)?),
            path,
        };

        tracing::debug!("opened state snapshot {}", state.path.display());
        Ok(state)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Takes the cross-process write lock. It is released when the returned file is dropped.
    fn lock(&self) -> StateResult<File> {
        fs::create_dir_all(self.parent_dir()).map_err(StateError::SnapshotWrite)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(StateError::SnapshotWrite)?;
        file.lock_exclusive().map_err(StateError::SnapshotWrite)?;
        Ok(file)
    }

    fn persist(&self, entries: &Entries) -> StateResult<()> {
        let wire = SnapshotWire {
            version: SNAPSHOT_FORMAT_VERSION,
            entries: entries
                .iter()
                .map(|(k, entry)| {
                    (
                        k.clone(),
                        EntryWire {
                            value: general_purpose::STANDARD.encode(&entry.value),
                            version: entry.version,
                        },
                    )
                })
                .collect(),
        };
        let raw = serde_json::to_vec_pretty(&wire).map_err(StateError::SnapshotSerialization)?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(self.parent_dir()).map_err(StateError::SnapshotWrite)?;
        tmp.write_all(&raw).map_err(StateError::SnapshotWrite)?;
        tmp.as_file().sync_all().map_err(StateError::SnapshotWrite)?;

        // A failed persist hands the temp file back; dropping it removes it from disk.
        tmp.persist(&self.path)
            .map_err(|e| StateError::SnapshotWrite(e.error))?;
        Ok(())
    }
}

/// Loads the snapshot at `path`; a missing file is an empty state.
fn read_snapshot(path: &Path) -> StateResult<Entries> {
    if !path.is_file() {
        return Ok(Entries::new());
    }

    let raw = fs::read(path).map_err(StateError::SnapshotRead)?;
    parse_snapshot(&raw)
}

fn parse_snapshot(raw: &[u8]) -> StateResult<Entries> {
    let wire: SnapshotWire = serde_json::from_slice(raw)
        .map_err(|e| StateError::SnapshotCorrupt(e.to_string()))?;

    if wire.version != SNAPSHOT_FORMAT_VERSION {
        return Err(StateError::SnapshotCorrupt(format!(
            "unsupported snapshot version {}",
            wire.version
        )));
    }

    wire.entries
        .into_iter()
        .map(|(key, entry)| {
            general_purpose::STANDARD
                .decode(entry.value)
                .map(|value| {
                    (
                        key.clone(),
                        Entry {
                            value,
                            version: entry.version,
                        },
                    )
                })
                .map_err(|e| StateError::SnapshotCorrupt(format!("value for key {key}: {e}")))
        })
        .collect()
}

impl WorldState for FileState {
    fn get_versioned(&self, key: &str) -> StateResult<Versioned> {
        validate_state_key(key)?;
        let entries = self.entries.lock().map_err(|_| StateError::Poisoned)?;
        Ok(versioned(&entries, key))
    }

    fn put_state(&self, key: &str, value: Vec<u8>, expected: Version) -> StateResult<Version> {
        validate_state_key(key)?;
        let mut entries = self.entries.lock().map_err(|_| StateError::Poisoned)?;
        let _lock = self.lock()?;

        let on_disk = read_snapshot(&self.path)?;
        let mut next = on_disk.clone();
        let version = match insert_at(&mut next, key, value, expected) {
            Ok(version) => version,
            Err(e) => {
                *entries = on_disk;
                return Err(e);
            }
        };

        self.persist(&next)?;
        *entries = next;

        Ok(version)
    }

    fn get_query_result(&self, selector: &Selector) -> StateResult<Vec<QueryResult>> {
        let entries = self.entries.lock().map_err(|_| StateError::Poisoned)?;
        Ok(select(&entries, selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("dir should be readable")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_open_missing_file_starts_empty_and_creates_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");

        let state = FileState::open(&path).expect("open should succeed");

        assert_eq!(state.get_state("P001").unwrap(), None);
        assert!(!path.exists(), "snapshot should not be created until first write");
    }

    #[test]
    fn test_writes_survive_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("state.json");

        let state = FileState::open(&path).expect("open should succeed");
        state
            .put_state("P001", br#"{"id":"P001"}"#.to_vec(), 0)
            .expect("write should succeed");
        state
            .put_state("bin", vec![0, 159, 146, 150], 0)
            .expect("write should succeed");
        state
            .put_state("bin", vec![1], 1)
            .expect("write at current version should succeed");
        drop(state);

        let reopened = FileState::open(&path).expect("reopen should succeed");
        assert_eq!(
            reopened.get_state("P001").unwrap().as_deref(),
            Some(&br#"{"id":"P001"}"#[..])
        );
        assert_eq!(
            reopened.get_versioned("bin").unwrap(),
            Versioned {
                value: Some(vec![1]),
                version: 2,
            }
        );
    }

    #[test]
    fn test_query_over_reopened_snapshot() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");

        let state = FileState::open(&path).unwrap();
        state.put_state("r1", br#"{"patientId":"A"}"#.to_vec(), 0).unwrap();
        state.put_state("r2", br#"{"patientId":"B"}"#.to_vec(), 0).unwrap();
        drop(state);

        let reopened = FileState::open(&path).unwrap();
        let results = reopened
            .get_query_result(&Selector::records_for_patient("A"))
            .expect("query should succeed");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "r1");
    }

    #[test]
    fn test_handles_on_one_file_merge_their_writes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");

        let first = FileState::open(&path).unwrap();
        let second = FileState::open(&path).unwrap();
        first.put_state("P1", b"{}".to_vec(), 0).expect("first write");
        second.put_state("P2", b"{}".to_vec(), 0).expect("second write");

        let reopened = FileState::open(&path).unwrap();
        assert!(reopened.get_state("P1").unwrap().is_some());
        assert!(reopened.get_state("P2").unwrap().is_some());
    }

    #[test]
    fn test_stale_handle_conflicts_and_then_sees_newer_value() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");

        let first = FileState::open(&path).unwrap();
        let second = FileState::open(&path).unwrap();
        first.put_state("P1", b"first".to_vec(), 0).unwrap();

        let stale = second.get_versioned("P1").unwrap();
        assert_eq!(stale.version, 0);
        let err = second
            .put_state("P1", b"second".to_vec(), stale.version)
            .expect_err("stale write should conflict");

        assert!(matches!(err, StateError::Conflict { expected: 0, found: 1, .. }));
        assert_eq!(second.get_state("P1").unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(
            FileState::open(&path).unwrap().get_state("P1").unwrap().as_deref(),
            Some(&b"first"[..])
        );
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let state = Arc::new(FileState::open(&path).unwrap());
                thread::spawn(move || {
                    for i in 0..5 {
                        state
                            .put_state(&format!("w{writer}-{i}"), b"{}".to_vec(), 0)
                            .expect("distinct keys should never conflict");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread should not panic");
        }

        let reopened = FileState::open(&path).unwrap();
        for writer in 0..4 {
            for i in 0..5 {
                assert!(reopened.get_state(&format!("w{writer}-{i}")).unwrap().is_some());
            }
        }
    }

    #[test]
    fn test_open_rejects_corrupt_snapshot() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");
        fs::write(&path, "not json at all").unwrap();

        let err = FileState::open(&path).expect_err("corrupt snapshot should be rejected");
        assert!(matches!(err, StateError::SnapshotCorrupt(_)));
    }

    #[test]
    fn test_open_rejects_unknown_version() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("state.json");
        fs::write(&path, r#"{"version": 99, "entries": {}}"#).unwrap();

        let err = FileState::open(&path).expect_err("unknown version should be rejected");
        assert!(matches!(err, StateError::SnapshotCorrupt(msg) if msg.contains("99")));
    }

    #[test]
    fn test_failed_persist_leaves_state_and_directory_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // A non-empty directory where the snapshot file should be makes the rename fail.
        let path = temp_dir.path().join("state.json");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let state = FileState::open(&path).expect("open should succeed");
        let err = state
            .put_state("P001", b"{}".to_vec(), 0)
            .expect_err("write over a directory should fail");

        assert!(matches!(err, StateError::SnapshotWrite(_)));
        assert_eq!(state.get_state("P001").unwrap(), None);
        assert_eq!(
            file_names(temp_dir.path()),
            vec!["state.json".to_string(), "state.json.lock".to_string()]
        );
    }
}
