//! Data Transfer Objects (DTOs) for API layer
//!
//! This module contains DTOs that define the external API contract.
//!
//! ## Guidelines
//!
//! - DTOs use serde for serialization/deserialization
//! - Request DTOs include validation via validator crate
//! - DTOs use utoipa for OpenAPI schema generation
//! - Types carrying a secret value redact it from `Debug`

pub mod secret;

pub use secret::{
    CreateSecretRequest, HealthResponse, SecretListResponse, SecretNameResponse, SecretResponse,
    UpdateSecretRequest,
};
