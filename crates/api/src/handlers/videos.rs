//! Handlers for the `/videos` resource.
//!
//! Reads go straight to the listing service. Writes go through the publish
//! pipeline, which owns the ordering of remote calls and their compensation.
//! Two publish paths exist:
//!
//! - direct: the client reserves an upload target, streams the bytes to the
//!   transcoder itself, then calls `POST /videos` with the asset id;
//! - relayed: the client posts the whole file as multipart to
//!   `POST /videos/publish` and the server performs every stage.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use vidhub_core::error::CoreError;
use vidhub_core::pagination::{clamp_limit, Page};
use vidhub_core::search::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use vidhub_core::types::DbId;
use vidhub_core::video::{VideoType, DEFAULT_VIDEO_LIMIT, MAX_VIDEO_LIMIT};
use vidhub_db::listing::{self, VideoCard};
use vidhub_db::repositories::VideoViewRepo;
use vidhub_pipeline::{
    FinalizeRequest, PublishRequest, ThumbnailChoice, VideoFile, VideoMetadataInput,
    VideoMetadataPatch,
};

use crate::error::{AppError, AppResult, ListError};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::{RequireAdmin, RequirePublisher};
use crate::query::{SearchParams, VideoListParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Thumbnail selection as sent by clients.
///
/// `custom` refers to an image already uploaded through `/uploads/presign`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ThumbnailInput {
    Stream { timestamp_secs: f64 },
    Custom { key: String },
}

impl Default for ThumbnailInput {
    fn default() -> Self {
        Self::Stream {
            timestamp_secs: 0.0,
        }
    }
}

impl From<ThumbnailInput> for ThumbnailChoice {
    fn from(input: ThumbnailInput) -> Self {
        match input {
            ThumbnailInput::Stream { timestamp_secs } => ThumbnailChoice::Stream { timestamp_secs },
            ThumbnailInput::Custom { key } => ThumbnailChoice::Uploaded { key },
        }
    }
}

/// Request body for `POST /videos/upload-target`.
#[derive(Debug, Deserialize)]
pub struct UploadTargetRequest {
    /// Size of the file the client is about to upload.
    pub size_bytes: u64,
}

/// Request body for `POST /videos`.
#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub asset_id: String,
    pub video_type: VideoType,
    pub title: String,
    pub description: Option<String>,
    pub game_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: ThumbnailInput,
}

/// Request body for `PATCH /videos/{id}`. Absent fields are left unchanged;
/// an empty description clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub game_type: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ViewRecorded {
    pub video_id: DbId,
    pub view_count: i64,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/videos
///
/// Single page of playable videos of one type (`normal` when omitted). The
/// page never carries a continuation cursor.
pub async fn list_videos(
    State(state): State<AppState>,
    params: Result<Query<VideoListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ListError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limit = clamp_limit(params.limit, DEFAULT_VIDEO_LIMIT, MAX_VIDEO_LIMIT);

    let items = listing::list_videos(
        &state.pool,
        &state.urls,
        params.video_type.unwrap_or(VideoType::Normal),
        params.sort,
        limit,
        params.cursor,
    )
    .await?;

    let page: Page<VideoCard> = Page {
        items,
        next_cursor: None,
        has_more: false,
    };
    Ok(Json(DataResponse::new(page)))
}

/// GET /api/v1/videos/search
///
/// A blank `q` yields an empty page.
pub async fn search_videos(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, ListError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);

    let results = listing::search_videos(
        &state.pool,
        &state.urls,
        &params.q,
        limit,
        params.cursor.as_ref(),
    )
    .await?;

    Ok(Json(DataResponse::new(results)))
}

/// GET /api/v1/videos/{id}
pub async fn get_video(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = listing::video_detail(&state.pool, &state.urls, video_id, viewer.user_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    Ok(Json(DataResponse::new(detail)))
}

/// POST /api/v1/videos/{id}/views
pub async fn record_view(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view_count = VideoViewRepo::record(&state.pool, video_id, viewer.user_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    tracing::debug!(video_id, user_id = ?viewer.user_id(), view_count, "View recorded");

    Ok(Json(DataResponse::new(ViewRecorded {
        video_id,
        view_count,
    })))
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

/// POST /api/v1/videos/upload-target
///
/// Reserve a one-time resumable upload endpoint for a file of `size_bytes`.
pub async fn create_upload_target(
    RequirePublisher(auth): RequirePublisher,
    State(state): State<AppState>,
    Json(input): Json<UploadTargetRequest>,
) -> AppResult<impl IntoResponse> {
    let target = state
        .pipeline
        .acquire_upload_target(&auth.actor(), input.size_bytes)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(target))))
}

/// POST /api/v1/videos
///
/// Create the video row for an asset the client uploaded directly.
pub async fn create_video(
    RequirePublisher(auth): RequirePublisher,
    State(state): State<AppState>,
    Json(input): Json<CreateVideoRequest>,
) -> AppResult<impl IntoResponse> {
    let video = state
        .pipeline
        .finalize(FinalizeRequest {
            uploader: auth.actor(),
            video_type: input.video_type,
            metadata: VideoMetadataInput {
                title: input.title,
                description: input.description,
                game_type: input.game_type,
                tags: input.tags,
            },
            asset_id: input.asset_id,
            thumbnail: input.thumbnail.into(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(video))))
}

/// POST /api/v1/videos/publish
///
/// Multipart fields:
///
/// ```text
/// video                 file (required)
/// video_type            normal | shorts (required)
/// title                 text (required)
/// description           text
/// game_type             text (required)
/// tags                  text, repeated
/// thumbnail             image file
/// thumbnail_key         key from /uploads/presign
/// thumbnail_timestamp   seconds into the video (default 0)
/// ```
///
/// The pipeline runs on its own task. If the client goes away the task is
/// cancelled and cleans up whatever it created.
pub async fn publish_video(
    RequirePublisher(auth): RequirePublisher,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut video: Option<VideoFile> = None;
    let mut video_type: Option<VideoType> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut game_type: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut thumbnail_upload: Option<ThumbnailChoice> = None;
    let mut thumbnail_key: Option<String> = None;
    let mut thumbnail_timestamp: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                video = Some(VideoFile {
                    bytes,
                    content_type,
                });
            }
            "thumbnail" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                thumbnail_upload = Some(ThumbnailChoice::Upload {
                    bytes,
                    content_type,
                });
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "video_type" => video_type = Some(VideoType::from_name(text.trim())?),
                    "title" => title = Some(text),
                    "description" => description = Some(text),
                    "game_type" => game_type = Some(text),
                    "tags" => tags.push(text),
                    "thumbnail_key" => thumbnail_key = Some(text),
                    "thumbnail_timestamp" => {
                        let secs = text.trim().parse::<f64>().map_err(|_| {
                            AppError::BadRequest(format!(
                                "thumbnail_timestamp must be a number of seconds, got '{text}'"
                            ))
                        })?;
                        thumbnail_timestamp = Some(secs);
                    }
                    other => {
                        tracing::debug!(field = other, "Ignoring unknown multipart field");
                    }
                }
            }
        }
    }

    let thumbnail = match (thumbnail_upload, thumbnail_key) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Send either a thumbnail file or a thumbnail_key, not both".into(),
            ))
        }
        (Some(upload), None) => upload,
        (None, Some(key)) => ThumbnailChoice::Uploaded { key },
        (None, None) => ThumbnailChoice::Stream {
            timestamp_secs: thumbnail_timestamp.unwrap_or(0.0),
        },
    };

    let request = PublishRequest {
        uploader: auth.actor(),
        video_type: video_type.ok_or_else(|| missing_field("video_type"))?,
        metadata: VideoMetadataInput {
            title: title.ok_or_else(|| missing_field("title"))?,
            description,
            game_type: game_type.ok_or_else(|| missing_field("game_type"))?,
            tags,
        },
        video: video.ok_or_else(|| missing_field("video"))?,
        thumbnail,
    };

    let cancel = CancellationToken::new();
    let _cancel_on_disconnect = cancel.clone().drop_guard();
    let pipeline = state.pipeline.clone();
    let video = tokio::spawn(async move { pipeline.publish(request, &cancel).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Publish task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(DataResponse::new(video))))
}

fn missing_field(name: &str) -> AppError {
    AppError::BadRequest(format!("Missing multipart field '{name}'"))
}

// ---------------------------------------------------------------------------
// Edit / delete
// ---------------------------------------------------------------------------

/// PATCH /api/v1/videos/{id}
pub async fn update_video(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<UpdateVideoRequest>,
) -> AppResult<impl IntoResponse> {
    let video = state
        .pipeline
        .update_metadata(
            video_id,
            &auth.actor(),
            VideoMetadataPatch {
                title: input.title,
                description: input.description,
                game_type: input.game_type,
                tags: input.tags,
            },
        )
        .await?;

    Ok(Json(DataResponse::new(video)))
}

/// PUT /api/v1/videos/{id}/thumbnail
pub async fn update_thumbnail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<ThumbnailInput>,
) -> AppResult<impl IntoResponse> {
    let video = state
        .pipeline
        .update_thumbnail(video_id, &auth.actor(), input.into())
        .await?;

    Ok(Json(DataResponse::new(video)))
}

/// GET /api/v1/videos/{id}/status
///
/// Re-read the transcoding status and store it on the video.
pub async fn refresh_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let video = state
        .pipeline
        .refresh_status(video_id, &auth.actor())
        .await?;

    Ok(Json(DataResponse::new(video)))
}

/// DELETE /api/v1/videos/{id}
///
/// Admin only. Remote cleanup failures are logged; the row is always
/// removed.
pub async fn delete_video(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .pipeline
        .delete_video(video_id, &admin.actor())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
