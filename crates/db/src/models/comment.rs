//! Comment entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidhub_core::types::{DbId, Timestamp};

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub video_id: DbId,
    pub user_id: DbId,
    pub content: String,
    /// `None` for top-level comments.
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment joined with its author and counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub author_image: Option<String>,
    pub like_count: i64,
    pub reply_count: i64,
}

/// DTO for inserting a comment. Content must already be validated.
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub video_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub parent_id: Option<DbId>,
}
