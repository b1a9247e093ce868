use vidhub_cloud::CloudError;
use vidhub_core::error::CoreError;

/// Errors surfaced by pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Validation, authorization, not-found and other domain errors.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A gateway call on the critical path failed.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
