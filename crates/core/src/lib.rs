//! # Ledger Core
//!
//! Core business logic for the patient ledger.
//!
//! This crate contains the record data model and the access-control rules applied to it:
//! - `Patient` and `PatientRecord` entities with their JSON world-state encoding
//! - [`RecordStore`], which owns every create/query/update/grant/revoke operation
//! - The [`WorldState`] seam through which all reads and writes reach the host store
//! - In-process state adapters (in-memory and file snapshot) and startup configuration
//!
//! **No API concerns**: HTTP servers, authentication and command-line parsing belong in
//! `api-rest`, `api-shared` and `ledger-cli`.

pub mod clock;
pub mod config;
pub mod constants;
pub mod entities;
pub mod error;
pub mod selector;
pub mod state;
pub mod store;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use constants::DEFAULT_STATE_FILE;
pub use entities::{
    Entity, EntityKind, NewPatient, NewPatientRecord, Patient, PatientRecord, RecordUpdate,
};
pub use error::{RecordError, RecordResult};
pub use selector::Selector;
pub use state::{
    FileState, MemoryState, QueryResult, StateError, StateResult, Version, Versioned, WorldState,
};
pub use store::RecordStore;
