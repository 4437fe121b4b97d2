use crate::entities::EntityKind;
use crate::state::StateError;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("the {kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("the {kind} {id} does not exist")]
    NotFound { kind: EntityKind, id: String },

    /// Record creation referenced a patient key with nothing stored under it.
    #[error("the patient {0} does not exist")]
    PatientNotFound(String),

    #[error("failed to decode {kind} {id}: schema mismatch at {path}: {message}")]
    Decode {
        kind: EntityKind,
        id: String,
        path: String,
        message: String,
    },

    #[error("failed to serialize {kind}: {source}")]
    Serialization {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("world state error: {0}")]
    Store(#[from] StateError),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
