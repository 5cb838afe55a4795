//! Secret HTTP handlers
//!
//! Thin adapters between JSON over HTTP and the [`SecretsOrchestrator`]:
//! each handler derives a request context, calls one orchestrator operation
//! and maps the outcome through [`ApiError`].
//!
//! [`SecretsOrchestrator`]: crate::secrets::SecretsOrchestrator

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use validator::Validate;

use crate::api::{
    dto::{
        CreateSecretRequest, SecretListResponse, SecretNameResponse, SecretResponse,
        UpdateSecretRequest,
    },
    error::{ApiError, ErrorBody},
    routes::ApiState,
};

#[utoipa::path(
    get,
    path = "/v1/secrets",
    responses(
        (status = 200, description = "Secret names", body = SecretListResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    ),
    tag = "secrets"
)]
#[instrument(skip(state))]
pub async fn list_secrets_handler(
    State(state): State<ApiState>,
) -> Result<Json<SecretListResponse>, ApiError> {
    let ctx = state.request_context();
    let secrets = state.secrets.list(&ctx).await?;
    Ok(Json(SecretListResponse { secrets }))
}

#[utoipa::path(
    get,
    path = "/v1/secrets/{name}",
    params(("name" = String, Path, description = "Secret name")),
    responses(
        (status = 200, description = "Secret value", body = SecretResponse),
        (status = 404, description = "Secret not found", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    ),
    tag = "secrets"
)]
#[instrument(skip(state))]
pub async fn get_secret_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<SecretResponse>, ApiError> {
    let ctx = state.request_context();
    let item = state.secrets.get(&ctx, &name).await?;
    Ok(Json(SecretResponse::from(item)))
}

#[utoipa::path(
    post,
    path = "/v1/secrets",
    request_body = CreateSecretRequest,
    responses(
        (status = 201, description = "Secret created", body = SecretNameResponse),
        (status = 400, description = "Malformed or invalid request", body = ErrorBody),
        (status = 409, description = "Secret already exists", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    ),
    tag = "secrets"
)]
#[instrument(skip(state, payload))]
pub async fn create_secret_handler(
    State(state): State<ApiState>,
    payload: Result<Json<CreateSecretRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SecretNameResponse>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let ctx = state.request_context();
    state.secrets.create(&ctx, &payload.name, &payload.value).await?;

    Ok((StatusCode::CREATED, Json(SecretNameResponse { name: payload.name })))
}

#[utoipa::path(
    put,
    path = "/v1/secrets/{name}",
    params(("name" = String, Path, description = "Secret name")),
    request_body = UpdateSecretRequest,
    responses(
        (status = 200, description = "Secret updated", body = SecretNameResponse),
        (status = 400, description = "Malformed or invalid request", body = ErrorBody),
        (status = 404, description = "Secret not found", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    ),
    tag = "secrets"
)]
#[instrument(skip(state, payload))]
pub async fn update_secret_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    payload: Result<Json<UpdateSecretRequest>, JsonRejection>,
) -> Result<Json<SecretNameResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let ctx = state.request_context();
    state.secrets.update(&ctx, &name, &payload.value).await?;

    Ok(Json(SecretNameResponse { name }))
}

#[utoipa::path(
    delete,
    path = "/v1/secrets/{name}",
    params(("name" = String, Path, description = "Secret name")),
    responses(
        (status = 204, description = "Secret deleted"),
        (status = 404, description = "Secret not found", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    ),
    tag = "secrets"
)]
#[instrument(skip(state))]
pub async fn delete_secret_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.request_context();
    state.secrets.delete(&ctx, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
