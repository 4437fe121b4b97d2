use super::{null_as_empty, Entity, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A medical record as stored in the world state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    /// Key of the owning patient. Checked once, when the record is created.
    pub patient_id: String,
    pub doctor_id: String,
    pub record_type: String,
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub medications: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ciphertext produced by the caller; stored verbatim.
    pub encrypted_data: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_control: Vec<String>,
    /// Written as `false` at creation. No operation changes it.
    pub emergency_access: bool,
}

impl Entity for PatientRecord {
    const KIND: EntityKind = EntityKind::PatientRecord;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields for a new medical record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewPatientRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub record_type: String,
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    pub medications: Vec<String>,
    pub encrypted_data: String,
    pub access_control: Vec<String>,
}

impl NewPatientRecord {
    pub fn into_record(self, now: DateTime<Utc>) -> PatientRecord {
        PatientRecord {
            id: self.id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            record_type: self.record_type,
            description: self.description,
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            medications: self.medications,
            created_at: now,
            updated_at: now,
            encrypted_data: self.encrypted_data,
            access_control: self.access_control,
            emergency_access: false,
        }
    }
}

/// Replacement values for the mutable fields of a record.
///
/// Every field is replaced wholesale; lists are not merged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    pub medications: Vec<String>,
    pub encrypted_data: String,
    pub access_control: Vec<String>,
}

impl RecordUpdate {
    /// Applies the update. Identity fields, `emergency_access` and `created_at` are kept.
    pub fn apply(self, record: &mut PatientRecord, at: DateTime<Utc>) {
        record.description = self.description;
        record.diagnosis = self.diagnosis;
        record.treatment = self.treatment;
        record.medications = self.medications;
        record.encrypted_data = self.encrypted_data;
        record.access_control = self.access_control;
        record.updated_at = at;
    }
}
