//! Video entity model, listing read model, and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidhub_core::error::CoreError;
use vidhub_core::types::{DbId, Timestamp};
use vidhub_core::video::{ThumbnailSetting, VideoStatus, VideoType};

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub game_type: String,
    pub video_type: String,
    pub tags: Vec<String>,
    pub duration_secs: Option<f64>,
    pub status: String,
    pub view_count: i64,
    /// Transcoder asset id; `None` means the video is not playable.
    pub stream_uid: Option<String>,
    pub thumbnail_source: String,
    pub thumbnail_timestamp: Option<f64>,
    pub custom_thumbnail_key: Option<String>,
    pub uploaded_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    /// Typed view of the three thumbnail columns.
    pub fn thumbnail(&self) -> Result<ThumbnailSetting, CoreError> {
        ThumbnailSetting::from_columns(
            &self.thumbnail_source,
            self.thumbnail_timestamp,
            self.custom_thumbnail_key.as_deref(),
        )
    }

    pub fn video_type(&self) -> Result<VideoType, CoreError> {
        VideoType::from_name(&self.video_type)
    }
}

/// A video joined with its uploader and reaction counts, as listed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: Video,
    pub uploader_name: String,
    pub uploader_image: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
}

/// DTO for inserting a video once the upload and thumbnail stages are done.
#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub title: String,
    pub description: Option<String>,
    pub game_type: String,
    pub video_type: VideoType,
    pub tags: Vec<String>,
    pub duration_secs: Option<f64>,
    pub status: VideoStatus,
    pub stream_uid: String,
    pub thumbnail: ThumbnailSetting,
    pub uploaded_by: DbId,
}
