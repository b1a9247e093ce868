//! Shared query parameter types for API handlers.

use serde::Deserialize;
use vidhub_core::search::SearchCursor;
use vidhub_core::types::DbId;
use vidhub_core::video::{VideoSort, VideoType};

/// `GET /videos?type=&sort=&limit=&cursor=`
#[derive(Debug, Deserialize)]
pub struct VideoListParams {
    #[serde(rename = "type")]
    pub video_type: Option<VideoType>,
    #[serde(default)]
    pub sort: VideoSort,
    pub limit: Option<i64>,
    pub cursor: Option<DbId>,
}

/// `GET /videos/search?q=&limit=&cursor=`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
    /// Opaque `next_cursor` token from the previous page.
    pub cursor: Option<SearchCursor>,
}

/// Generic cursor pagination (`?cursor=&limit=`).
#[derive(Debug, Deserialize)]
pub struct CursorParams {
    pub cursor: Option<DbId>,
    pub limit: Option<i64>,
}

/// `GET /videos/{id}/comments?cursor=&parent_id=`
#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub cursor: Option<DbId>,
    pub parent_id: Option<DbId>,
}
