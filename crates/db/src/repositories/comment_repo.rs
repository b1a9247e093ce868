//! Repository for the `comments` table.

use sqlx::PgPool;
use vidhub_core::types::DbId;

use crate::models::comment::{Comment, CommentWithAuthor, CreateComment};

/// Column list for `comments` queries.
const COLUMNS: &str = "id, video_id, user_id, content, parent_id, created_at, updated_at";

/// Provides CRUD and thread listing for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a new comment, returning the created row.
    ///
    /// The reply-depth rule is also enforced by the `trg_comments_depth`
    /// trigger, which raises a `check_violation`.
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (video_id, user_id, content, parent_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.video_id)
            .bind(input.user_id)
            .bind(&input.content)
            .bind(input.parent_id)
            .fetch_one(pool)
            .await
    }

    /// Find a comment by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Comments of one thread level, newest first, strictly after `cursor`.
    ///
    /// When the cursor comment has been deleted the page continues by id,
    /// which follows the same order since ids and `created_at` are both
    /// assigned at insert.
    ///
    /// `parent_id = None` selects top-level comments; `Some(id)` selects the
    /// direct replies to that comment.
    pub async fn list_thread(
        pool: &PgPool,
        video_id: DbId,
        parent_id: Option<DbId>,
        cursor: Option<DbId>,
        fetch: i64,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            "WITH s AS ( \
                 SELECT c.id, c.video_id, c.user_id, c.content, c.parent_id, \
                        c.created_at, c.updated_at, \
                        u.name AS author_name, u.image AS author_image, \
                        (SELECT COUNT(*) FROM comment_likes l WHERE l.comment_id = c.id) \
                            AS like_count, \
                        (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id) \
                            AS reply_count \
                 FROM comments c \
                 JOIN users u ON u.id = c.user_id \
                 WHERE c.video_id = $1 AND c.parent_id IS NOT DISTINCT FROM $2::BIGINT) \
             SELECT * FROM s \
             WHERE $3::BIGINT IS NULL \
                OR (s.created_at, s.id) < (SELECT x.created_at, x.id FROM s x WHERE x.id = $3) \
                OR (NOT EXISTS (SELECT 1 FROM s x WHERE x.id = $3) AND s.id < $3) \
             ORDER BY s.created_at DESC, s.id DESC \
             LIMIT $4",
        )
        .bind(video_id)
        .bind(parent_id)
        .bind(cursor)
        .bind(fetch)
        .fetch_all(pool)
        .await
    }

    /// Delete a comment. Replies and likes cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
