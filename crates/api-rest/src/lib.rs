//! # API REST
//!
//! REST API implementation for the patient ledger.
//!
//! Handles:
//! - HTTP endpoints with axum, one per ledger operation
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, CORS, API key checks, per-invocation transaction ids)
//!
//! Uses `api-shared` for request/response types and `ledger-core` for the operations.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use api_shared::auth::{validate_api_key, API_KEY_HEADER};
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use ledger_core::RecordStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Response header carrying the transaction id assigned to an invocation.
pub const TX_ID_HEADER: &str = "x-tx-id";

/// Application state shared across REST handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: RecordStore,
    /// Expected API key. `None` disables authentication.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: RecordStore, api_key: Option<String>) -> Self {
        Self {
            store,
            api_key: api_key.map(Arc::from),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::init_ledger,
        handlers::create_patient,
        handlers::query_patient,
        handlers::patient_exists,
        handlers::query_patient_records_by_patient,
        handlers::grant_emergency_access,
        handlers::revoke_emergency_access,
        handlers::create_patient_record,
        handlers::query_patient_record,
        handlers::patient_record_exists,
        handlers::update_patient_record,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::CreatePatientReq,
        api_shared::CreatePatientRecordReq,
        api_shared::UpdatePatientRecordReq,
        api_shared::EmergencyAccessReq,
        api_shared::PatientRes,
        api_shared::PatientRecordRes,
        api_shared::ListPatientRecordsRes,
        api_shared::ExistsRes,
        api_shared::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router.
///
/// Every route except `/health` and the Swagger UI requires the API key when one is
/// configured.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/ledger/init", post(handlers::init_ledger))
        .route("/patients", post(handlers::create_patient))
        .route("/patients/:id", get(handlers::query_patient))
        .route("/patients/:id/exists", get(handlers::patient_exists))
        .route(
            "/patients/:id/records",
            get(handlers::query_patient_records_by_patient),
        )
        .route(
            "/patients/:id/emergency-access",
            post(handlers::grant_emergency_access),
        )
        .route(
            "/patients/:id/emergency-access/:provider_id",
            axum::routing::delete(handlers::revoke_emergency_access),
        )
        .route("/records", post(handlers::create_patient_record))
        .route(
            "/records/:id",
            get(handlers::query_patient_record).put(handlers::update_patient_record),
        )
        .route("/records/:id/exists", get(handlers::patient_record_exists))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(assign_tx_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match validate_api_key(provided, state.api_key.as_deref()) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::warn!("rejected request to {}: {}", req.uri().path(), e);
            error::unauthorized(e.to_string()).into_response()
        }
    }
}

/// Runs each invocation inside a span tagged with a fresh transaction id.
async fn assign_tx_id(req: Request, next: Next) -> Response {
    let tx_id = uuid::Uuid::new_v4().simple().to_string();
    let span = tracing::info_span!(
        "invocation",
        tx_id = %tx_id,
        method = %req.method(),
        path = %req.uri().path()
    );

    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&tx_id) {
        response.headers_mut().insert(TX_ID_HEADER, value);
    }
    response
}
