//! Request and response types for the secrets API

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::secrets::{validate_name, Item};

/// Request to create a new secret
#[derive(Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSecretRequest {
    /// Name of the secret (must be unique under the configured prefix)
    #[validate(custom(function = "validate_secret_name"))]
    #[schema(example = "db-password")]
    pub name: String,

    /// Secret value
    #[validate(length(min = 1, message = "value is required"))]
    #[schema(example = "s3cr3t")]
    pub value: String,
}

impl fmt::Debug for CreateSecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSecretRequest")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Same rules the orchestrator applies, so a bad name is a 400 at the boundary.
fn validate_secret_name(name: &str) -> Result<(), ValidationError> {
    validate_name(name).map_err(|e| {
        ValidationError::new("invalid_secret_name").with_message(e.to_string().into())
    })
}

/// Request to replace the value of an existing secret
#[derive(Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSecretRequest {
    /// New secret value
    #[validate(length(min = 1, message = "value is required"))]
    pub value: String,
}

impl fmt::Debug for UpdateSecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSecretRequest").field("value", &"[REDACTED]").finish()
    }
}

/// Names of all secrets under the configured prefix
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SecretListResponse {
    pub secrets: Vec<String>,
}

/// A secret and its value
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct SecretResponse {
    pub name: String,
    pub value: String,
}

impl From<Item> for SecretResponse {
    fn from(item: Item) -> Self {
        Self { name: item.name, value: item.value }
    }
}

impl fmt::Debug for SecretResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResponse")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Acknowledgement of a create or update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SecretNameResponse {
    pub name: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status (always "healthy" when responding)
    #[schema(example = "healthy")]
    pub status: String,

    /// Active backend type
    #[schema(example = "vault")]
    pub backend: String,
}
