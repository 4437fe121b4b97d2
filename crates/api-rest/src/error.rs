//! Mapping from record errors to HTTP responses.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::Json;
use ledger_core::{RecordError, StateError};

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorRes>);

/// Converts a [`RecordError`] into a status code and JSON body, logging it on the way.
///
/// Client errors are logged at `warn`, server and substrate errors at `error`.
pub fn record_error(err: RecordError) -> ApiError {
    let (status, kind) = match &err {
        RecordError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
        RecordError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        RecordError::PatientNotFound(_) => (StatusCode::NOT_FOUND, "patient_not_found"),
        RecordError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
        RecordError::Store(StateError::InvalidKey(_)) => (StatusCode::BAD_REQUEST, "invalid_key"),
        RecordError::Store(StateError::Conflict { .. }) => (StatusCode::CONFLICT, "write_conflict"),
        RecordError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_error"),
        RecordError::Decode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
        RecordError::Serialization { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
        }
    };

    if status.is_server_error() {
        tracing::error!("{} error: {:?}", kind, err);
    } else {
        tracing::warn!("{} error: {}", kind, err);
    }

    (
        status,
        Json(ErrorRes {
            kind: kind.into(),
            message: err.to_string(),
        }),
    )
}

pub fn unauthorized(message: String) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorRes {
            kind: "unauthenticated".into(),
            message,
        }),
    )
}
