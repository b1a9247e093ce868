use std::sync::Arc;
use std::time::Duration;

use vidhub_cloud::config::{CloudBackend, StorageConfig, StreamConfig, DEFAULT_PRESIGN_TTL_SECS};
use vidhub_cloud::memory::{FakeTranscoder, InMemoryStorage};
use vidhub_cloud::{
    ChunkTransport, CloudError, S3Storage, StorageGateway, StreamClient, TranscodingGateway,
    TusTransport,
};
use vidhub_core::urls::PublicUrls;
use vidhub_pipeline::{PipelineConfig, PostPublisher, PublishPipeline};

use crate::config::ServerConfig;

/// The external services the process talks to, with the public URLs their
/// objects are served from.
#[derive(Clone)]
pub struct Gateways {
    pub storage: Arc<dyn StorageGateway>,
    pub transcoder: Arc<dyn TranscodingGateway>,
    pub transport: Arc<dyn ChunkTransport>,
    pub urls: PublicUrls,
    pub presign_ttl: Duration,
}

impl Gateways {
    /// Wire gateways according to `CLOUD_BACKEND`.
    pub async fn from_env() -> Result<Self, CloudError> {
        match CloudBackend::from_env()? {
            CloudBackend::Live => {
                let storage_config = StorageConfig::from_env()?;
                let stream_config = StreamConfig::from_env()?;
                let urls = PublicUrls::new(
                    storage_config.public_base_url.clone(),
                    stream_config.delivery_base.clone(),
                );
                Ok(Self {
                    storage: Arc::new(S3Storage::new(&storage_config).await),
                    transcoder: Arc::new(StreamClient::new(stream_config)),
                    transport: Arc::new(TusTransport::new()),
                    presign_ttl: storage_config.presign_ttl,
                    urls,
                })
            }
            CloudBackend::Memory => {
                tracing::warn!("CLOUD_BACKEND=memory: uploads are kept in process memory");
                let storage_base = std::env::var("S3_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "memory://objects".into());
                let stream_base = std::env::var("STREAM_DELIVERY_BASE")
                    .unwrap_or_else(|_| "memory://stream".into());
                Ok(Self::in_memory(
                    Arc::new(InMemoryStorage::new()),
                    Arc::new(FakeTranscoder::new()),
                    PublicUrls::new(storage_base, stream_base),
                ))
            }
        }
    }

    /// Gateways backed by the in-process fakes.
    pub fn in_memory(
        storage: Arc<InMemoryStorage>,
        transcoder: Arc<FakeTranscoder>,
        urls: PublicUrls,
    ) -> Self {
        Self {
            storage,
            transcoder: transcoder.clone(),
            transport: transcoder,
            urls,
            presign_ttl: Duration::from_secs(DEFAULT_PRESIGN_TTL_SECS),
        }
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: vidhub_db::DbPool,
    /// Server configuration (JWT settings, upload limits).
    pub config: Arc<ServerConfig>,
    /// Public URL builder for objects and transcoded assets.
    pub urls: Arc<PublicUrls>,
    /// Object storage, used directly for presigned uploads.
    pub storage: Arc<dyn StorageGateway>,
    /// Lifetime of presigned upload URLs.
    pub presign_ttl: Duration,
    /// Video write paths.
    pub pipeline: PublishPipeline,
    /// Post write paths.
    pub posts: PostPublisher,
}

impl AppState {
    pub fn new(
        pool: vidhub_db::DbPool,
        config: ServerConfig,
        gateways: Gateways,
        pipeline_config: PipelineConfig,
    ) -> Self {
        let Gateways {
            storage,
            transcoder,
            transport,
            urls,
            presign_ttl,
        } = gateways;

        Self {
            pipeline: PublishPipeline::new(
                pool.clone(),
                storage.clone(),
                transcoder.clone(),
                transport,
                pipeline_config,
            ),
            posts: PostPublisher::new(pool.clone(), storage.clone(), transcoder),
            pool,
            config: Arc::new(config),
            urls: Arc::new(urls),
            storage,
            presign_ttl,
        }
    }
}
