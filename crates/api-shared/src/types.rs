//! Request and response bodies for the ledger API.
//!
//! Field names are camelCase on the wire, matching the stored entity documents. Conversions
//! to and from the `ledger-core` types live here so handlers stay thin.

use chrono::{DateTime, Utc};
use ledger_core::{NewPatient, NewPatientRecord, Patient, PatientRecord, RecordUpdate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientReq {
    pub id: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_info: String,
    pub blood_group: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub public_key: String,
}

impl From<CreatePatientReq> for NewPatient {
    fn from(req: CreatePatientReq) -> Self {
        NewPatient {
            id: req.id,
            name: req.name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            contact_info: req.contact_info,
            blood_group: req.blood_group,
            allergies: req.allergies,
            public_key: req.public_key,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRecordReq {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub record_type: String,
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub medications: Vec<String>,
    pub encrypted_data: String,
    #[serde(default)]
    pub access_control: Vec<String>,
}

impl From<CreatePatientRecordReq> for NewPatientRecord {
    fn from(req: CreatePatientRecordReq) -> Self {
        NewPatientRecord {
            id: req.id,
            patient_id: req.patient_id,
            doctor_id: req.doctor_id,
            record_type: req.record_type,
            description: req.description,
            diagnosis: req.diagnosis,
            treatment: req.treatment,
            medications: req.medications,
            encrypted_data: req.encrypted_data,
            access_control: req.access_control,
        }
    }
}

/// Full replacement of a record's mutable fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRecordReq {
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub medications: Vec<String>,
    pub encrypted_data: String,
    #[serde(default)]
    pub access_control: Vec<String>,
}

impl From<UpdatePatientRecordReq> for RecordUpdate {
    fn from(req: UpdatePatientRecordReq) -> Self {
        RecordUpdate {
            description: req.description,
            diagnosis: req.diagnosis,
            treatment: req.treatment,
            medications: req.medications,
            encrypted_data: req.encrypted_data,
            access_control: req.access_control,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAccessReq {
    pub provider_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRes {
    pub id: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_info: String,
    pub blood_group: String,
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub public_key: String,
    pub emergency_access: Vec<String>,
}

impl From<Patient> for PatientRes {
    fn from(p: Patient) -> Self {
        PatientRes {
            id: p.id,
            name: p.name,
            date_of_birth: p.date_of_birth,
            gender: p.gender,
            contact_info: p.contact_info,
            blood_group: p.blood_group,
            allergies: p.allergies,
            created_at: p.created_at,
            updated_at: p.updated_at,
            public_key: p.public_key,
            emergency_access: p.emergency_access,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecordRes {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub record_type: String,
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    pub medications: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub encrypted_data: String,
    pub access_control: Vec<String>,
    pub emergency_access: bool,
}

impl From<PatientRecord> for PatientRecordRes {
    fn from(r: PatientRecord) -> Self {
        PatientRecordRes {
            id: r.id,
            patient_id: r.patient_id,
            doctor_id: r.doctor_id,
            record_type: r.record_type,
            description: r.description,
            diagnosis: r.diagnosis,
            treatment: r.treatment,
            medications: r.medications,
            created_at: r.created_at,
            updated_at: r.updated_at,
            encrypted_data: r.encrypted_data,
            access_control: r.access_control,
            emergency_access: r.emergency_access,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientRecordsRes {
    pub records: Vec<PatientRecordRes>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExistsRes {
    pub id: String,
    pub exists: bool,
}

/// Body returned with every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Stable error kind, e.g. `already_exists` or `not_found`.
    pub kind: String,
    pub message: String,
}
