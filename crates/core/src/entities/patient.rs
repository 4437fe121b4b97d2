use super::{null_as_empty, Entity, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A patient as stored in the world state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_info: String,
    pub blood_group: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque credential material; never inspected here.
    pub public_key: String,
    /// Providers holding emergency access. Treated as a set: no provider appears twice.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emergency_access: Vec<String>,
}

impl Entity for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Patient {
    pub fn has_emergency_access(&self, provider_id: &str) -> bool {
        self.emergency_access.iter().any(|p| p == provider_id)
    }

    /// Adds `provider_id` to the emergency-access set.
    ///
    /// Returns `false` and leaves the patient untouched (including `updated_at`) when the
    /// provider is already present.
    pub fn grant_emergency_access(&mut self, provider_id: &str, at: DateTime<Utc>) -> bool {
        if self.has_emergency_access(provider_id) {
            return false;
        }

        self.emergency_access.push(provider_id.to_owned());
        self.updated_at = at;
        true
    }

    /// Removes `provider_id` from the emergency-access set and stamps `updated_at`.
    ///
    /// The timestamp moves whether or not the provider was present.
    pub fn revoke_emergency_access(&mut self, provider_id: &str, at: DateTime<Utc>) {
        self.emergency_access.retain(|p| p != provider_id);
        self.updated_at = at;
    }
}

/// Caller-supplied fields for a new patient.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewPatient {
    pub id: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_info: String,
    pub blood_group: String,
    pub allergies: Vec<String>,
    pub public_key: String,
}

impl NewPatient {
    /// Builds the stored patient, with both timestamps set to `now` and no emergency access.
    pub fn into_patient(self, now: DateTime<Utc>) -> Patient {
        Patient {
            id: self.id,
            name: self.name,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            contact_info: self.contact_info,
            blood_group: self.blood_group,
            allergies: self.allergies,
            created_at: now,
            updated_at: now,
            public_key: self.public_key,
            emergency_access: Vec::new(),
        }
    }
}
