//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in this crate reads environment variables during request handling; binaries read
//! them and hand the raw values to the helpers below.

use crate::constants::DEFAULT_STATE_FILE;
use crate::error::{RecordError, RecordResult};
use crate::state::{FileState, MemoryState, WorldState};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Which in-process world-state adapter to open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StateBackend {
    #[default]
    Memory,
    File,
}

impl FromStr for StateBackend {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StateBackend::Memory),
            "file" => Ok(StateBackend::File),
            other => Err(RecordError::InvalidInput(format!(
                "unknown state backend '{other}' (expected 'memory' or 'file')"
            ))),
        }
    }
}

impl fmt::Display for StateBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateBackend::Memory => write!(f, "memory"),
            StateBackend::File => write!(f, "file"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    state_backend: StateBackend,
    state_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] if the file backend is selected with an empty
    /// snapshot path.
    pub fn new(state_backend: StateBackend, state_file: PathBuf) -> RecordResult<Self> {
        if state_backend == StateBackend::File && state_file.as_os_str().is_empty() {
            return Err(RecordError::InvalidInput(
                "state_file cannot be empty for the file backend".into(),
            ));
        }

        Ok(Self {
            state_backend,
            state_file,
        })
    }

    pub fn state_backend(&self) -> StateBackend {
        self.state_backend
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }
}

/// Parse the state backend from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StateBackend::Memory`].
pub fn state_backend_from_env_value(value: Option<String>) -> RecordResult<StateBackend> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<StateBackend>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Resolve the snapshot path from an optional string value, defaulting to
/// [`DEFAULT_STATE_FILE`].
pub fn state_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}

/// Opens the world state selected by `cfg`.
///
/// # Errors
///
/// Returns [`RecordError::Store`] if the snapshot file exists but cannot be loaded.
pub fn open_state(cfg: &CoreConfig) -> RecordResult<Arc<dyn WorldState>> {
    let state: Arc<dyn WorldState> = match cfg.state_backend() {
        StateBackend::Memory => Arc::new(MemoryState::new()),
        StateBackend::File => Arc::new(FileState::open(cfg.state_file())?),
    };

    tracing::info!("opened {} world state", cfg.state_backend());
    Ok(state)
}
