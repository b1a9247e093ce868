use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vidhub_core::error::CoreError;
use vidhub_pipeline::PipelineError;

/// Check constraint whose message is written for end users.
const USER_FACING_CHECKS: &[&str] = &["ck_comments_depth"];

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vidhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Core(core) => AppError::Core(core),
            PipelineError::Cloud(cloud) => AppError::Core(cloud.into()),
            PipelineError::Database(db) => AppError::Database(db),
        }
    }
}

/// Status, machine-readable code, and client-safe message for an error.
pub struct ErrorParts {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn parts(&self) -> ErrorParts {
        let (status, code, message) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::ExternalService(msg) => {
                    tracing::error!(error = %msg, "External service error");
                    (
                        StatusCode::BAD_GATEWAY,
                        "EXTERNAL_SERVICE_ERROR",
                        "An upstream service failed, please try again".to_string(),
                    )
                }
                CoreError::Configuration(msg) => {
                    tracing::error!(error = %msg, "Configuration error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIGURATION_ERROR",
                        "The server is not configured for this operation".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };
        ErrorParts {
            status,
            code,
            message,
        }
    }

    /// Whether the client should prompt for login.
    pub fn requires_auth(&self) -> bool {
        matches!(self, AppError::Core(CoreError::Unauthorized(_)))
    }

    fn body(&self) -> (StatusCode, serde_json::Value) {
        let parts = self.parts();
        let mut body = json!({
            "success": false,
            "error": parts.message,
            "code": parts.code,
        });
        if self.requires_auth() {
            body["requires_auth"] = json!(true);
        }
        (parts.status, body)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.body();
        (status, axum::Json(body)).into_response()
    }
}

/// Error for list endpoints: the usual error body plus an empty page, so
/// clients can render the list unconditionally.
#[derive(Debug)]
pub struct ListError(pub AppError);

impl From<AppError> for ListError {
    fn from(err: AppError) -> Self {
        ListError(err)
    }
}

impl From<sqlx::Error> for ListError {
    fn from(err: sqlx::Error) -> Self {
        ListError(AppError::Database(err))
    }
}

impl From<CoreError> for ListError {
    fn from(err: CoreError) -> Self {
        ListError(AppError::Core(err))
    }
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        let (status, mut body) = self.0.body();
        body["items"] = json!([]);
        body["next_cursor"] = serde_json::Value::Null;
        body["has_more"] = json!(false);
        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Foreign key violations map to 404 (the referenced row is gone).
/// - Check violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
pub fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") if constraint.starts_with("uq_") => {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
                // foreign_key_violation
                Some("23503") => {
                    return (
                        StatusCode::NOT_FOUND,
                        "NOT_FOUND",
                        "Referenced resource not found".to_string(),
                    );
                }
                // check_violation
                Some("23514") => {
                    let message = if USER_FACING_CHECKS.contains(&constraint) {
                        db_err.message().to_string()
                    } else {
                        format!("Value violates check constraint: {constraint}")
                    };
                    return (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message);
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
