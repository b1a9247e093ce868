//! Gateways to the external services behind vidhub: an S3-compatible
//! object store and a managed video-ingest service.
//!
//! Both are modelled as traits ([`StorageGateway`], [`TranscodingGateway`])
//! so the pipeline and the HTTP layer hold `Arc<dyn ...>` handles and the
//! in-process fakes in [`memory`] can stand in during tests and local
//! development.

pub mod config;
pub mod error;
pub mod memory;
pub mod storage;
pub mod transcoding;
pub mod tus;

pub use error::CloudError;
pub use storage::{PresignedUpload, S3Storage, StorageGateway};
pub use transcoding::{AssetState, AssetStatus, StreamClient, TranscodingGateway, UploadTarget};
pub use tus::{ChunkTransport, TusTransport};
