//! Repository for the `video_views` table.

use sqlx::PgPool;
use vidhub_core::types::DbId;

/// Records individual views and keeps `videos.view_count` in step.
pub struct VideoViewRepo;

impl VideoViewRepo {
    /// Insert a view row and increment the video's counter in one
    /// transaction. Returns the new count, or `None` if the video does not
    /// exist.
    pub async fn record(
        pool: &PgPool,
        video_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let count: Option<(i64,)> = sqlx::query_as(
            "UPDATE videos SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(video_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((count,)) = count else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("INSERT INTO video_views (video_id, user_id) VALUES ($1, $2)")
            .bind(video_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(count))
    }

    /// Number of recorded view rows for a video.
    pub async fn count_rows(pool: &PgPool, video_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM video_views WHERE video_id = $1")
                .bind(video_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
