//! Ledger entities and their world-state encoding.
//!
//! Both entity kinds are stored as JSON documents under their `id`, in one shared key space.
//! Decoding is lenient in two ways: unknown fields are ignored, and a `null` list is read as
//! empty. Everything else must match the schema, and a mismatch reports the path of the field
//! that failed.

mod patient;
mod record;

pub use patient::{NewPatient, Patient};
pub use record::{NewPatientRecord, PatientRecord, RecordUpdate};

use crate::error::{RecordError, RecordResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The two kinds of document stored in the world state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Patient,
    PatientRecord,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Patient => write!(f, "patient"),
            EntityKind::PatientRecord => write!(f, "record"),
        }
    }
}

/// A document type with a stable key.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

/// Serialises an entity to its stored JSON form.
pub fn encode<T: Entity>(entity: &T) -> RecordResult<Vec<u8>> {
    serde_json::to_vec(entity).map_err(|source| RecordError::Serialization {
        kind: T::KIND,
        source,
    })
}

/// Decodes the bytes stored under `key` as an entity of type `T`.
///
/// # Errors
///
/// Returns [`RecordError::Decode`] if the bytes are not a JSON document matching `T`, with
/// `path` naming the failing field (`<root>` when the document as a whole is malformed).
pub fn decode<T: Entity>(key: &str, bytes: &[u8]) -> RecordResult<T> {
    let decode_error = |path: String, message: String| RecordError::Decode {
        kind: T::KIND,
        id: key.to_owned(),
        path,
        message,
    };

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let entity = match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(entity) => entity,
        Err(err) => {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            return Err(decode_error(path, err.into_inner().to_string()));
        }
    };

    deserializer
        .end()
        .map_err(|e| decode_error("<root>".into(), e.to_string()))?;

    Ok(entity)
}

/// Reads a list field, treating `null` as an empty list.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
