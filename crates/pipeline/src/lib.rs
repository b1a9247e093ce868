//! Write-side orchestration for vidhub.
//!
//! The publish pipeline moves a video through the transcoding service,
//! object storage and the database in strict stage order. The remaining
//! modules are the pieces it is built from: resumable byte transfer,
//! bounded status polling, and compensating cleanup.

pub mod cleanup;
pub mod error;
pub mod icons;
pub mod posts;
pub mod publish;
pub mod status;
pub mod transfer;

pub use cleanup::{CleanupPlan, CleanupReport, Compensation};
pub use error::{PipelineError, PipelineResult};
pub use posts::{ImageUpload, PostPublisher, PublishedPost};
pub use publish::{
    FinalizeRequest, PipelineConfig, PublishPipeline, PublishRequest, ThumbnailChoice,
    VideoFile, VideoMetadataInput, VideoMetadataPatch,
};
pub use status::{PollOutcome, PollPolicy};
pub use transfer::{RetryPolicy, TransferOptions, TransferReport};
