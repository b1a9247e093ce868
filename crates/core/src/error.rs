use crate::types::DbId;

/// Domain error taxonomy shared by every layer above `core`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// No session, or the session could not be verified. Callers should show
    /// a login prompt rather than a generic error.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Object storage or transcoder call failed on a critical path.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Required credentials or endpoints are missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
