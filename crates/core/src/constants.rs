//! Constants used throughout the ledger core crate.

/// Default location of the world-state snapshot file used by the file backend.
pub const DEFAULT_STATE_FILE: &str = "ledger_state.json";

/// Document field holding the owning patient of a medical record.
pub const PATIENT_ID_FIELD: &str = "patientId";

/// Leading character reserved by the host store for composite keys.
pub const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';

/// Format version written into state snapshot files.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 2;
