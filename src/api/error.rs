use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::secrets::{ErrorKind, SecretsError};

#[derive(Debug)]
pub enum ApiError {
    /// Malformed JSON, missing or empty fields.
    BadRequest(String),
    /// A classified secrets failure; the status follows its kind.
    Secrets(SecretsError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Secrets(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::AlreadyExists => StatusCode::CONFLICT,
                ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
                ErrorKind::Cancelled => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::AuthenticationFailure
                | ErrorKind::BackendUnavailable
                | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Secrets(err) => err.kind().as_str(),
        }
    }
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code (`not_found`, `already_exists`, `bad_request`, ...)
    #[schema(example = "not_found")]
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = error_code, "Request failed: {:?}", self);
        }

        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Secrets(err) => err.to_string(),
        };

        (status, Json(ErrorBody { error: error_code.to_string(), message })).into_response()
    }
}

impl From<SecretsError> for ApiError {
    fn from(err: SecretsError) -> Self {
        ApiError::Secrets(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Invalid request: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_kind_to_status_mapping() {
        let cases = [
            (SecretsError::not_found("k"), StatusCode::NOT_FOUND, "not_found"),
            (SecretsError::already_exists("k"), StatusCode::CONFLICT, "already_exists"),
            (SecretsError::validation("bad"), StatusCode::BAD_REQUEST, "validation_error"),
            (SecretsError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT, "cancelled"),
            (
                SecretsError::authentication_failed("expired"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "authentication_failure",
            ),
            (
                SecretsError::backend_unavailable("down"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "backend_unavailable",
            ),
            (SecretsError::unknown("boom"), StatusCode::INTERNAL_SERVER_ERROR, "unknown"),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, body) = body_of(ApiError::from(err)).await;
            assert_eq!(status, expected_status);
            assert_eq!(body.error, expected_code);
            assert!(!body.message.is_empty());
        }
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let (status, body) = body_of(ApiError::BadRequest("value is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.message, "value is required");
    }
}
