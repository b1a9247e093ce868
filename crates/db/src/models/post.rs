//! Community post and post image models.

use serde::Serialize;
use sqlx::FromRow;
use vidhub_core::types::{DbId, Timestamp};

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: DbId,
    pub content: String,
    pub author_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `post_images` table. Only the object key is stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostImage {
    pub id: DbId,
    pub post_id: DbId,
    pub image_key: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A post joined with its author and like count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub author_name: String,
    pub author_image: Option<String>,
    pub like_count: i64,
}

/// DTO for inserting a post. Images are already in object storage;
/// `image_keys` order becomes `sort_order`.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub author_id: DbId,
    pub content: String,
    pub image_keys: Vec<String>,
}
