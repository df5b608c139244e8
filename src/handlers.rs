use crate::enrichment::PropertyEnricher;
use crate::errors::AppError;
use crate::models::*;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Enrichment pipeline with its provider and store clients.
    pub enricher: PropertyEnricher,
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "property-enrichment-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/properties
///
/// Single entry point for property operations. Only `create` is supported: the
/// payload is enriched with provider data and stored as a new row.
///
/// # Returns
///
/// * `Result<Json<PropertyResponse>, AppError>` - `{ "data": <record> }`, or an error
///   when the operation is unknown or the record could not be stored.
pub async fn property_operation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PropertyRequest>,
) -> Result<Json<PropertyResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "property_operation",
        %request_id,
        operation = %request.operation
    );

    run_operation(&state, request).instrument(span).await.map(Json)
}

async fn run_operation(
    state: &AppState,
    request: PropertyRequest,
) -> Result<PropertyResponse, AppError> {
    tracing::info!("POST /properties");

    match request.operation.as_str() {
        "create" => {
            let record = state.enricher.create_property(&request.payload).await?;
            Ok(PropertyResponse { data: record })
        }
        other => Err(AppError::BadRequest(format!(
            "Unsupported operation '{}'",
            other
        ))),
    }
}

/// API routes with state attached. Middleware that needs connection info
/// (rate limiting) is layered on in `main`.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/properties", post(property_operation))
        .with_state(state)
}

/// Routes exempt from rate limiting.
pub fn public_routes() -> Router {
    Router::new().route("/health", get(health))
}
