//! Health check endpoint for monitoring and readiness probes

use axum::{extract::State, http::StatusCode, Json};

use crate::api::{dto::HealthResponse, routes::ApiState};

/// Health check endpoint
///
/// Returns 200 OK with the active backend type while the server is running.
/// Does not call the backend.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = state.secrets.backend_type().to_string();
    (StatusCode::OK, Json(HealthResponse { status: "healthy".to_string(), backend }))
}
