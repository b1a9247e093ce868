//! Shared helpers for the HTTP integration tests.
//!
//! The app is the production router over the in-memory gateways, driven with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, RgbImage};
use sqlx::PgPool;
use tower::ServiceExt;
use vidhub_api::auth::jwt::{generate_access_token, JwtConfig};
use vidhub_api::config::{default_max_upload_bytes, ServerConfig};
use vidhub_api::router::build_app_router;
use vidhub_api::state::{AppState, Gateways};
use vidhub_cloud::memory::{FakeTranscoder, InMemoryStorage};
use vidhub_core::roles::Role;
use vidhub_core::types::DbId;
use vidhub_core::urls::PublicUrls;
use vidhub_core::video::{ThumbnailSetting, VideoStatus, VideoType};
use vidhub_db::models::user::CreateUser;
use vidhub_db::models::video::{CreateVideo, Video};
use vidhub_db::repositories::{UserRepo, VideoRepo};
use vidhub_pipeline::{PipelineConfig, PollPolicy, RetryPolicy, TransferOptions};

pub const STORAGE_BASE: &str = "https://cdn.test";
pub const STREAM_BASE: &str = "https://stream.test";
pub const MULTIPART_BOUNDARY: &str = "vidhub-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: default_max_upload_bytes(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

fn fast_pipeline() -> PipelineConfig {
    PipelineConfig {
        transfer: TransferOptions {
            chunk_size: 1024,
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

/// The router plus handles on the fakes behind it.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: ServerConfig,
    pub storage: Arc<InMemoryStorage>,
    pub transcoder: Arc<FakeTranscoder>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Create a user with `role` and return its id and a bearer token.
    pub async fn user(&self, name: &str, role: Role) -> (DbId, String) {
        let user = UserRepo::create(
            &self.pool,
            &CreateUser {
                name: name.to_string(),
                image: None,
                role: role.as_str().to_string(),
            },
        )
        .await
        .unwrap();
        let token = generate_access_token(user.id, role.as_str(), &self.config.jwt).unwrap();
        (user.id, token)
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let storage = Arc::new(InMemoryStorage::new());
    let transcoder = Arc::new(FakeTranscoder::new());
    let gateways = Gateways::in_memory(
        storage.clone(),
        transcoder.clone(),
        PublicUrls::new(STORAGE_BASE, STREAM_BASE),
    );

    let state = AppState::new(pool.clone(), config.clone(), gateways, fast_pipeline());
    TestApp {
        router: build_app_router(state, &config),
        pool,
        config,
        storage,
        transcoder,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
}

async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        request(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_empty(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::POST, uri, token).body(Body::empty()).unwrap()).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        request(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn json_auth(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        request(method, uri, Some(token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_auth(app, Method::POST, uri, token, body).await
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        content_type: &'a str,
        bytes: Vec<u8>,
    },
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    parts: Vec<Part<'_>>,
) -> Response<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        request(Method::POST, uri, Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a playable video directly.
pub async fn seed_video(
    pool: &PgPool,
    uploaded_by: DbId,
    title: &str,
    video_type: VideoType,
    asset_id: &str,
) -> Video {
    VideoRepo::create(
        pool,
        &CreateVideo {
            title: title.to_string(),
            description: Some(format!("{title} description")),
            game_type: "platformer".to_string(),
            video_type,
            tags: vec!["speedrun".to_string()],
            duration_secs: Some(30.0),
            status: VideoStatus::Ready,
            stream_uid: asset_id.to_string(),
            thumbnail: ThumbnailSetting::Stream {
                timestamp_secs: 0.0,
            },
            uploaded_by,
        },
    )
    .await
    .unwrap()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn mp4_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
