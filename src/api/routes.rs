use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, response::IntoResponse, response::Response, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::observability::log_http_requests;
use crate::secrets::{OpContext, SecretsError, SecretsOrchestrator};

use super::{
    docs,
    error::ApiError,
    handlers::{
        create_secret_handler, delete_secret_handler, get_secret_handler, health_handler,
        list_secrets_handler, update_secret_handler,
    },
};

#[derive(Clone)]
pub struct ApiState {
    pub secrets: Arc<SecretsOrchestrator>,
    pub request_timeout: Duration,
}

impl ApiState {
    pub fn new(secrets: Arc<SecretsOrchestrator>, request_timeout: Duration) -> Self {
        Self { secrets, request_timeout }
    }

    /// Context for one request: cancelled at shutdown, bounded by the timeout.
    pub fn request_context(&self) -> OpContext {
        self.secrets.request_context(self.request_timeout)
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/v1/secrets", get(list_secrets_handler).post(create_secret_handler))
        .route(
            "/v1/secrets/{name}",
            get(get_secret_handler).put(update_secret_handler).delete(delete_secret_handler),
        )
        .route("/health", get(health_handler))
        .merge(docs::docs_router())
        .layer(middleware::from_fn(log_http_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// A panicking handler answers 500 with the usual error body.
fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    ApiError::Secrets(SecretsError::unknown("request handler panicked")).into_response()
}
