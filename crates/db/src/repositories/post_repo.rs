//! Repository for the `posts` and `post_images` tables.

use sqlx::PgPool;
use vidhub_core::types::DbId;

use crate::models::post::{CreatePost, Post, PostImage, PostWithAuthor};

/// Column list for `posts` queries.
const POST_COLUMNS: &str = "id, content, author_id, created_at, updated_at";

/// Column list for `post_images` queries.
const IMAGE_COLUMNS: &str = "id, post_id, image_key, sort_order, created_at, updated_at";

/// Provides CRUD and listing for posts and their images.
pub struct PostRepo;

impl PostRepo {
    /// Insert a post and its image rows in one transaction.
    pub async fn create(pool: &PgPool, input: &CreatePost) -> Result<Post, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO posts (content, author_id) VALUES ($1, $2) RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(&input.content)
            .bind(input.author_id)
            .fetch_one(&mut *tx)
            .await?;

        for (order, key) in input.image_keys.iter().enumerate() {
            sqlx::query(
                "INSERT INTO post_images (post_id, image_key, sort_order) VALUES ($1, $2, $3)",
            )
            .bind(post.id)
            .bind(key)
            .bind(order as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(post)
    }

    /// Find a post by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Images of several posts, grouped by post and in display order.
    pub async fn images_for_posts(
        pool: &PgPool,
        post_ids: &[DbId],
    ) -> Result<Vec<PostImage>, sqlx::Error> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {IMAGE_COLUMNS} FROM post_images \
             WHERE post_id = ANY($1) \
             ORDER BY post_id, sort_order, id"
        );
        sqlx::query_as::<_, PostImage>(&query)
            .bind(post_ids)
            .fetch_all(pool)
            .await
    }

    /// Posts newest first, strictly after `cursor`. A deleted cursor post
    /// falls back to id order.
    pub async fn list_page(
        pool: &PgPool,
        cursor: Option<DbId>,
        fetch: i64,
    ) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, PostWithAuthor>(
            "WITH s AS ( \
                 SELECT p.id, p.content, p.author_id, p.created_at, p.updated_at, \
                        u.name AS author_name, u.image AS author_image, \
                        (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count \
                 FROM posts p \
                 JOIN users u ON u.id = p.author_id) \
             SELECT * FROM s \
             WHERE $1::BIGINT IS NULL \
                OR (s.created_at, s.id) < (SELECT x.created_at, x.id FROM s x WHERE x.id = $1) \
                OR (NOT EXISTS (SELECT 1 FROM s x WHERE x.id = $1) AND s.id < $1) \
             ORDER BY s.created_at DESC, s.id DESC \
             LIMIT $2",
        )
        .bind(cursor)
        .bind(fetch)
        .fetch_all(pool)
        .await
    }

    /// Delete a post (images cascade), returning the deleted image keys so
    /// the caller can clean up object storage.
    ///
    /// Returns `None` if no post with the given ID exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let keys: Vec<(String,)> = sqlx::query_as(
            "SELECT image_key FROM post_images WHERE post_id = $1 ORDER BY sort_order, id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(keys.into_iter().map(|(k,)| k).collect()))
    }
}
