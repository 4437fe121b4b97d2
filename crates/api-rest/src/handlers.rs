//! REST handlers, one per ledger operation.

use crate::error::{record_error, ApiError};
use crate::AppState;
use api_shared::{
    CreatePatientRecordReq, CreatePatientReq, EmergencyAccessReq, ErrorRes, ExistsRes,
    HealthRes, HealthService, ListPatientRecordsRes, PatientRecordRes, PatientRes,
    UpdatePatientRecordReq,
};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Not subject to API key checks.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/ledger/init",
    responses(
        (status = 204, description = "Ledger initialised")
    )
)]
#[axum::debug_handler]
pub async fn init_ledger(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.init_ledger().map_err(record_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created"),
        (status = 409, description = "Id already taken, or created concurrently", body = ErrorRes),
        (status = 503, description = "World state unavailable", body = ErrorRes)
    )
)]
/// Create a new patient
///
/// The patient starts with no emergency access and `createdAt == updatedAt`.
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .create_patient(req.into())
        .map_err(record_error)?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 500, description = "Stored value is not a patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn query_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.store.query_patient(&id).map_err(record_error)?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/exists",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Existence check", body = ExistsRes)
    )
)]
#[axum::debug_handler]
pub async fn patient_exists(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ExistsRes>, ApiError> {
    let exists = state.store.patient_exists(&id).map_err(record_error)?;
    Ok(Json(ExistsRes { id, exists }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/records",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Records owned by the patient, possibly empty", body = ListPatientRecordsRes),
        (status = 500, description = "A matched value is not a record", body = ErrorRes)
    )
)]
/// List the medical records of a patient
///
/// Order is whatever the query engine returns.
#[axum::debug_handler]
pub async fn query_patient_records_by_patient(
    State(state): State<AppState>,
    AxumPath(patient_id): AxumPath<String>,
) -> Result<Json<ListPatientRecordsRes>, ApiError> {
    let records = state
        .store
        .query_patient_records_by_patient(&patient_id)
        .map_err(record_error)?;
    Ok(Json(ListPatientRecordsRes {
        records: records.into_iter().map(PatientRecordRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/emergency-access",
    params(("id" = String, Path, description = "Patient id")),
    request_body = EmergencyAccessReq,
    responses(
        (status = 204, description = "Provider holds emergency access"),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 409, description = "Concurrent write to the patient, retry", body = ErrorRes)
    )
)]
/// Grant emergency access to a provider
///
/// Granting twice is accepted and leaves the patient unchanged.
#[axum::debug_handler]
pub async fn grant_emergency_access(
    State(state): State<AppState>,
    AxumPath(patient_id): AxumPath<String>,
    Json(req): Json<EmergencyAccessReq>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .grant_emergency_access(&patient_id, &req.provider_id)
        .map_err(record_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/patients/{id}/emergency-access/{provider_id}",
    params(
        ("id" = String, Path, description = "Patient id"),
        ("provider_id" = String, Path, description = "Provider to revoke")
    ),
    responses(
        (status = 204, description = "Provider no longer holds emergency access"),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 409, description = "Concurrent write to the patient, retry", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn revoke_emergency_access(
    State(state): State<AppState>,
    AxumPath((patient_id, provider_id)): AxumPath<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .revoke_emergency_access(&patient_id, &provider_id)
        .map_err(record_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/records",
    request_body = CreatePatientRecordReq,
    responses(
        (status = 201, description = "Record created"),
        (status = 404, description = "Owning patient does not exist", body = ErrorRes),
        (status = 409, description = "Id already taken", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_patient_record(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientRecordReq>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .create_patient_record(req.into())
        .map_err(record_error)?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/records/{id}",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Medical record", body = PatientRecordRes),
        (status = 404, description = "No such record", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn query_patient_record(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientRecordRes>, ApiError> {
    let record = state.store.query_patient_record(&id).map_err(record_error)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    get,
    path = "/records/{id}/exists",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Existence check", body = ExistsRes)
    )
)]
#[axum::debug_handler]
pub async fn patient_record_exists(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ExistsRes>, ApiError> {
    let exists = state
        .store
        .patient_record_exists(&id)
        .map_err(record_error)?;
    Ok(Json(ExistsRes { id, exists }))
}

#[utoipa::path(
    put,
    path = "/records/{id}",
    params(("id" = String, Path, description = "Record id")),
    request_body = UpdatePatientRecordReq,
    responses(
        (status = 204, description = "Record updated"),
        (status = 404, description = "No such record", body = ErrorRes),
        (status = 409, description = "Concurrent write to the record, retry", body = ErrorRes)
    )
)]
/// Replace the mutable fields of a record
///
/// Identity fields, `emergencyAccess` and `createdAt` are never changed.
#[axum::debug_handler]
pub async fn update_patient_record(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdatePatientRecordReq>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .update_patient_record(&id, req.into())
        .map_err(record_error)?;
    Ok(StatusCode::NO_CONTENT)
}
