//! Pipeline wiring over the in-memory gateways.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::{ImageFormat, RgbImage};
use sqlx::PgPool;
use vidhub_cloud::memory::{FakeTranscoder, InMemoryStorage};
use vidhub_cloud::{AssetStatus, ChunkTransport, StorageGateway, TranscodingGateway};
use vidhub_core::roles::{Actor, Role};
use vidhub_db::models::user::CreateUser;
use vidhub_db::repositories::UserRepo;
use vidhub_pipeline::{
    PipelineConfig, PollPolicy, PostPublisher, PublishPipeline, RetryPolicy, TransferOptions,
    VideoFile, VideoMetadataInput,
};

pub struct Harness {
    pub pool: PgPool,
    pub storage: Arc<InMemoryStorage>,
    pub transcoder: Arc<FakeTranscoder>,
    pub pipeline: PublishPipeline,
    pub posts: PostPublisher,
}

pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        transfer: TransferOptions {
            chunk_size: 256,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
        },
        poll: PollPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(1),
        },
        ..PipelineConfig::default()
    }
}

pub fn harness(pool: PgPool) -> Harness {
    harness_with(pool, fast_config())
}

pub fn harness_with(pool: PgPool, config: PipelineConfig) -> Harness {
    let storage = Arc::new(InMemoryStorage::new());
    let transcoder = Arc::new(FakeTranscoder::new());

    let storage_gw: Arc<dyn StorageGateway> = storage.clone();
    let transcoder_gw: Arc<dyn TranscodingGateway> = transcoder.clone();
    let transport: Arc<dyn ChunkTransport> = transcoder.clone();

    Harness {
        pipeline: PublishPipeline::new(
            pool.clone(),
            storage_gw.clone(),
            transcoder_gw.clone(),
            transport,
            config,
        ),
        posts: PostPublisher::new(pool.clone(), storage_gw, transcoder_gw),
        pool,
        storage,
        transcoder,
    }
}

pub async fn actor(pool: &PgPool, name: &str, role: Role) -> Actor {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            image: None,
            role: role.as_str().to_string(),
        },
    )
    .await
    .unwrap();
    Actor {
        user_id: user.id,
        role,
    }
}

pub fn metadata(title: &str) -> VideoMetadataInput {
    VideoMetadataInput {
        title: title.to_string(),
        description: Some("a run".to_string()),
        game_type: "platformer".to_string(),
        tags: vec!["speedrun".to_string()],
    }
}

pub fn mp4(len: usize) -> VideoFile {
    VideoFile {
        bytes: (0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into(),
        content_type: "video/mp4".to_string(),
    }
}

/// Acquire an upload target as `uploader` and move its asset to `status`,
/// as if the client had finished a direct upload.
pub async fn acquired(h: &Harness, uploader: &Actor, status: AssetStatus) -> String {
    let target = h
        .pipeline
        .acquire_upload_target(uploader, 1000)
        .await
        .unwrap();
    h.transcoder.set_status(&target.asset_id, status);
    target.asset_id
}

pub fn png(width: u32, height: u32) -> Bytes {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    Bytes::from(out.into_inner())
}

pub async fn video_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}
