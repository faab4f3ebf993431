//! Domain errors for the bot helper.

use thiserror::Error;

/// Domain-level errors that can occur while serving tenants.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Tenant already registered for catalog {0}")]
    TenantAlreadyExists(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Commerce API error: {0}")]
    CommerceApi(String),

    #[error("API key lacks credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Integration activation failed: {0}")]
    ActivationFailed(String),

    #[error("Gateway API error: {0}")]
    GatewayApi(String),

    #[error("Event stream error: {0}")]
    EventStream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Localization error: {0}")]
    Localization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
