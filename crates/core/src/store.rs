//! Patient and medical-record operations.
//!
//! [`RecordStore`] owns every rule of the ledger: key uniqueness, the one-time patient check on
//! record creation, and the emergency-access set. It reads and writes only through the
//! injected [`WorldState`], and each operation performs its reads followed by at most one
//! write, so it maps onto a single host transaction.
//!
//! Writes carry the version of the key as it was read. If another invocation wrote the key in
//! between, the write fails with [`StateError::Conflict`](crate::state::StateError::Conflict)
//! wrapped in [`RecordError::Store`] and nothing is changed; the caller may retry.
//!
//! ## Pure Data Operations
//!
//! This module contains **only** data operations. Transport, authentication and argument
//! parsing belong in `api-rest` and `ledger-cli`.

use crate::clock::{Clock, SystemClock};
use crate::entities::{
    decode, encode, Entity, EntityKind, NewPatient, NewPatientRecord, Patient, PatientRecord,
    RecordUpdate,
};
use crate::error::{RecordError, RecordResult};
use crate::selector::Selector;
use crate::state::{Version, WorldState};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Service for patient and medical-record operations.
///
/// Cheap to clone; clones share the same state and clock.
#[derive(Clone)]
pub struct RecordStore {
    state: Arc<dyn WorldState>,
    clock: Arc<dyn Clock>,
}

impl RecordStore {
    /// Creates a store over `state` using wall-clock timestamps.
    pub fn new(state: Arc<dyn WorldState>) -> Self {
        Self::with_clock(state, Arc::new(SystemClock))
    }

    pub fn with_clock(state: Arc<dyn WorldState>, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    /// Ledger bootstrap step. Touches no state and always succeeds.
    pub fn init_ledger(&self) -> RecordResult<()> {
        tracing::info!("ledger initialised");
        Ok(())
    }

    /// Creates a new patient.
    ///
    /// The patient is written with `created_at == updated_at == now` and an empty
    /// emergency-access set.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if:
    /// - anything is already stored under the patient's id ([`RecordError::AlreadyExists`])
    /// - the world state read or write fails, or a concurrent write to the same key got there
    ///   first ([`RecordError::Store`])
    pub fn create_patient(&self, new_patient: NewPatient) -> RecordResult<()> {
        let slot = self.state.get_versioned(&new_patient.id)?;
        if slot.value.is_some() {
            tracing::warn!("rejected create of existing patient {}", new_patient.id);
            return Err(RecordError::AlreadyExists {
                kind: EntityKind::Patient,
                id: new_patient.id,
            });
        }

        let patient = new_patient.into_patient(self.clock.now());
        self.write(&patient, slot.version)?;

        tracing::info!("created patient {}", patient.id);
        Ok(())
    }

    /// Creates a new medical record for an existing patient.
    ///
    /// The id check runs before the patient check, so a duplicate id is reported as
    /// `AlreadyExists` even when the patient is also missing.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if:
    /// - anything is already stored under the record's id ([`RecordError::AlreadyExists`])
    /// - nothing is stored under `patient_id` ([`RecordError::PatientNotFound`])
    /// - the world state read or write fails, or a concurrent write to the same key got there
    ///   first ([`RecordError::Store`])
    pub fn create_patient_record(&self, new_record: NewPatientRecord) -> RecordResult<()> {
        let slot = self.state.get_versioned(&new_record.id)?;
        if slot.value.is_some() {
            tracing::warn!("rejected create of existing record {}", new_record.id);
            return Err(RecordError::AlreadyExists {
                kind: EntityKind::PatientRecord,
                id: new_record.id,
            });
        }

        if !self.patient_exists(&new_record.patient_id)? {
            tracing::warn!(
                "rejected record {} for unknown patient {}",
                new_record.id,
                new_record.patient_id
            );
            return Err(RecordError::PatientNotFound(new_record.patient_id));
        }

        let record = new_record.into_record(self.clock.now());
        self.write(&record, slot.version)?;

        tracing::info!("created record {} for patient {}", record.id, record.patient_id);
        Ok(())
    }

    /// Returns the patient stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if:
    /// - nothing is stored under `id` ([`RecordError::NotFound`])
    /// - the stored bytes are not a patient ([`RecordError::Decode`])
    /// - the world state read fails ([`RecordError::Store`])
    pub fn query_patient(&self, id: &str) -> RecordResult<Patient> {
        self.read(id).map(|(patient, _)| patient)
    }

    /// Returns the medical record stored under `id`.
    ///
    /// # Errors
    ///
    /// As for [`query_patient`](Self::query_patient).
    pub fn query_patient_record(&self, id: &str) -> RecordResult<PatientRecord> {
        self.read(id).map(|(record, _)| record)
    }

    /// Returns every medical record whose `patientId` equals `patient_id`.
    ///
    /// Order is whatever the query engine returns. No match is an empty list, not an error,
    /// and the patient itself need not exist.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if:
    /// - the query engine fails ([`RecordError::Store`])
    /// - any matched document does not decode as a record ([`RecordError::Decode`]); no
    ///   partial results are returned in that case
    pub fn query_patient_records_by_patient(
        &self,
        patient_id: &str,
    ) -> RecordResult<Vec<PatientRecord>> {
        let selector = Selector::records_for_patient(patient_id);
        tracing::debug!("running selector query {}", selector.to_query_string());

        let results = self.state.get_query_result(&selector)?;

        results
            .iter()
            .map(|result| decode::<PatientRecord>(&result.key, &result.value))
            .collect()
    }

    /// Replaces the mutable fields of an existing record.
    ///
    /// `id`, `patient_id`, `doctor_id`, `record_type`, `emergency_access` and `created_at`
    /// are left as stored. The owning patient is not re-checked.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if:
    /// - nothing is stored under `id` ([`RecordError::NotFound`])
    /// - the stored bytes are not a record ([`RecordError::Decode`])
    /// - the world state read or write fails, or a concurrent write to the same key got there
    ///   first ([`RecordError::Store`])
    pub fn update_patient_record(&self, id: &str, update: RecordUpdate) -> RecordResult<()> {
        let (mut record, version): (PatientRecord, _) = self.read(id)?;

        let at = self.next_updated_at(record.updated_at);
        update.apply(&mut record, at);
        self.write(&record, version)?;

        tracing::info!("updated record {}", record.id);
        Ok(())
    }

    /// Grants `provider_id` emergency access to a patient.
    ///
    /// Granting to a provider that already holds access succeeds without writing anything,
    /// so `updated_at` is not touched in that case.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if:
    /// - the patient does not exist ([`RecordError::NotFound`])
    /// - the stored bytes are not a patient ([`RecordError::Decode`])
    /// - the world state read or write fails, or a concurrent write to the same key got there
    ///   first ([`RecordError::Store`])
    pub fn grant_emergency_access(&self, patient_id: &str, provider_id: &str) -> RecordResult<()> {
        let (mut patient, version): (Patient, _) = self.read(patient_id)?;

        let at = self.next_updated_at(patient.updated_at);
        if !patient.grant_emergency_access(provider_id, at) {
            tracing::debug!(
                "provider {} already has emergency access to patient {}",
                provider_id,
                patient_id
            );
            return Ok(());
        }

        self.write(&patient, version)?;

        tracing::info!(
            "granted emergency access to patient {} for provider {}",
            patient_id,
            provider_id
        );
        Ok(())
    }

    /// Revokes emergency access for `provider_id`.
    ///
    /// The patient is always rewritten with a fresh `updated_at`, even when the provider held
    /// no access. This differs from [`grant_emergency_access`](Self::grant_emergency_access),
    /// which skips the write for a repeat grant.
    ///
    /// # Errors
    ///
    /// As for [`grant_emergency_access`](Self::grant_emergency_access).
    pub fn revoke_emergency_access(&self, patient_id: &str, provider_id: &str) -> RecordResult<()> {
        let (mut patient, version): (Patient, _) = self.read(patient_id)?;

        let at = self.next_updated_at(patient.updated_at);
        patient.revoke_emergency_access(provider_id, at);
        self.write(&patient, version)?;

        tracing::info!(
            "revoked emergency access to patient {} for provider {}",
            patient_id,
            provider_id
        );
        Ok(())
    }

    /// Returns true if anything is stored under `id`.
    ///
    /// Patients and records share one key space, so this is a key check only.
    pub fn patient_exists(&self, id: &str) -> RecordResult<bool> {
        self.exists(id)
    }

    /// Returns true if anything is stored under `id`.
    pub fn patient_record_exists(&self, id: &str) -> RecordResult<bool> {
        self.exists(id)
    }

    fn exists(&self, id: &str) -> RecordResult<bool> {
        Ok(self.state.get_state(id)?.is_some())
    }

    /// Reads an entity along with the version the write-back must match.
    fn read<T: Entity>(&self, id: &str) -> RecordResult<(T, Version)> {
        tracing::debug!("reading {} {}", T::KIND, id);

        let slot = self.state.get_versioned(id)?;
        match slot.value {
            Some(bytes) => Ok((decode(id, &bytes)?, slot.version)),
            None => Err(RecordError::NotFound {
                kind: T::KIND,
                id: id.to_owned(),
            }),
        }
    }

    fn write<T: Entity>(&self, entity: &T, expected: Version) -> RecordResult<()> {
        let bytes = encode(entity)?;
        self.state.put_state(entity.id(), bytes, expected)?;
        Ok(())
    }

    /// `updated_at` for a mutation: the clock reading, but never earlier than `previous`.
    fn next_updated_at(&self, previous: DateTime<Utc>) -> DateTime<Utc> {
        self.clock.now().max(previous)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}
