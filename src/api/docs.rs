use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::api::dto::{
    CreateSecretRequest, HealthResponse, SecretListResponse, SecretNameResponse, SecretResponse,
    UpdateSecretRequest,
};
use crate::api::error::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::secrets::list_secrets_handler,
        crate::api::handlers::secrets::get_secret_handler,
        crate::api::handlers::secrets::create_secret_handler,
        crate::api::handlers::secrets::update_secret_handler,
        crate::api::handlers::secrets::delete_secret_handler
    ),
    components(
        schemas(
            CreateSecretRequest,
            UpdateSecretRequest,
            SecretListResponse,
            SecretResponse,
            SecretNameResponse,
            HealthResponse,
            ErrorBody
        )
    ),
    tags(
        (name = "secrets", description = "Secret CRUD over the configured backend"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document at `/api-docs/openapi.json`.
pub fn docs_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
