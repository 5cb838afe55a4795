//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use vaultgate::{
    api::{build_router, ApiState},
    config::BackendConfig,
    secrets::{BackendRegistry, OpContext},
    startup::{bootstrap, SecretsRuntime},
};

/// A router over a freshly authenticated memory backend.
pub struct TestApp {
    pub router: Router,
    pub runtime: SecretsRuntime,
}

impl TestApp {
    pub async fn memory() -> Self {
        Self::memory_with_timeout(Duration::from_secs(30)).await
    }

    pub async fn memory_with_timeout(request_timeout: Duration) -> Self {
        let config = BackendConfig { backend_type: "memory".to_string(), ..Default::default() };
        let registry = BackendRegistry::with_builtin_backends();
        let runtime = bootstrap(&config, &registry, &OpContext::background())
            .await
            .expect("memory backend should start");

        let state = ApiState::new(runtime.orchestrator.clone(), request_timeout);
        Self { router: build_router(state), runtime }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        TestResponse { status, request_id, bytes: bytes.to_vec() }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or_else(|e| {
            panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&self.bytes))
        })
    }

    /// The `error` code of a failure body.
    pub fn error_code(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }
}
