//! Repository for the `videos` table.
//!
//! Listing queries use keyset pagination: rows are ordered by
//! `(sort_key, id)` and a page continues strictly after the cursor with a
//! row-value comparison. `list_playable` resolves the sort key from the
//! cursor row; `search` receives it inside the cursor.

use sqlx::PgPool;
use vidhub_core::search::SearchCursor;
use vidhub_core::types::DbId;
use vidhub_core::video::{ThumbnailSetting, ValidMetadata, VideoSort, VideoStatus, VideoType};

use crate::models::video::{CreateVideo, Video, VideoSummary};

/// Column list for `videos` queries.
const COLUMNS: &str = "\
    id, title, description, game_type, video_type, tags, duration_secs, status, \
    view_count, stream_uid, thumbnail_source, thumbnail_timestamp, custom_thumbnail_key, \
    uploaded_by, created_at, updated_at";

/// Summary projection: video columns, uploader, and reaction counts.
const SUMMARY_SELECT: &str = "\
    SELECT v.id, v.title, v.description, v.game_type, v.video_type, v.tags, \
           v.duration_secs, v.status, v.view_count, v.stream_uid, v.thumbnail_source, \
           v.thumbnail_timestamp, v.custom_thumbnail_key, v.uploaded_by, \
           v.created_at, v.updated_at, \
           u.name AS uploader_name, u.image AS uploader_image, \
           (SELECT COUNT(*) FROM video_likes l WHERE l.video_id = v.id) AS like_count, \
           (SELECT COUNT(*) FROM comments c WHERE c.video_id = v.id) AS comment_count \
    FROM videos v \
    JOIN users u ON u.id = v.uploaded_by";

/// Sort key column (on the summary CTE) and direction for each ordering.
fn sort_key(sort: VideoSort) -> (&'static str, &'static str, &'static str) {
    match sort {
        VideoSort::Latest => ("created_at", "DESC", "<"),
        VideoSort::Earliest => ("created_at", "ASC", ">"),
        VideoSort::Liked => ("like_count", "DESC", "<"),
        VideoSort::Viewed => ("view_count", "DESC", "<"),
    }
}

/// Whether id order matches the sort order, so a deleted cursor row can be
/// continued from by id alone.
fn id_follows_sort(sort: VideoSort) -> bool {
    matches!(sort, VideoSort::Latest | VideoSort::Earliest)
}

/// Provides CRUD and listing queries for videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos \
                (title, description, game_type, video_type, tags, duration_secs, status, \
                 stream_uid, thumbnail_source, thumbnail_timestamp, custom_thumbnail_key, \
                 uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.game_type)
            .bind(input.video_type.as_str())
            .bind(&input.tags)
            .bind(input.duration_secs)
            .bind(input.status.as_str())
            .bind(&input.stream_uid)
            .bind(input.thumbnail.source().as_str())
            .bind(input.thumbnail.timestamp_secs())
            .bind(input.thumbnail.custom_key())
            .bind(input.uploaded_by)
            .fetch_one(pool)
            .await
    }

    /// Find a video by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a video with uploader and counts.
    pub async fn find_summary(pool: &PgPool, id: DbId) -> Result<Option<VideoSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE v.id = $1");
        sqlx::query_as::<_, VideoSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Playable videos of one type, `limit` rows strictly after `cursor`.
    pub async fn list_playable(
        pool: &PgPool,
        video_type: VideoType,
        sort: VideoSort,
        limit: i64,
        cursor: Option<DbId>,
    ) -> Result<Vec<VideoSummary>, sqlx::Error> {
        let (key, dir, op) = sort_key(sort);
        let by_id = if id_follows_sort(sort) {
            format!("OR (NOT EXISTS (SELECT 1 FROM s c WHERE c.id = $2) AND s.id {op} $2)")
        } else {
            String::new()
        };
        let query = format!(
            "WITH s AS ({SUMMARY_SELECT} \
                 WHERE v.video_type = $1 AND v.stream_uid IS NOT NULL) \
             SELECT * FROM s \
             WHERE $2::BIGINT IS NULL \
                OR (s.{key}, s.id) {op} (SELECT c.{key}, c.id FROM s c WHERE c.id = $2) \
                {by_id} \
             ORDER BY s.{key} {dir}, s.id {dir} \
             LIMIT $3"
        );
        sqlx::query_as::<_, VideoSummary>(&query)
            .bind(video_type.as_str())
            .bind(cursor)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Playable videos matching `query`, most viewed first.
    ///
    /// `query` must already be normalized (non-blank). Title, description and
    /// uploader name match as case-insensitive substrings; a tag matches only
    /// when it equals the whole query, ignoring case.
    pub async fn search(
        pool: &PgPool,
        query: &str,
        fetch: i64,
        cursor: Option<&SearchCursor>,
    ) -> Result<Vec<VideoSummary>, sqlx::Error> {
        let pattern = vidhub_core::search::like_pattern(query);
        let sql = format!(
            "WITH s AS ({SUMMARY_SELECT} \
                 WHERE v.stream_uid IS NOT NULL \
                   AND (v.title ILIKE $1 ESCAPE '\\' \
                        OR v.description ILIKE $1 ESCAPE '\\' \
                        OR u.name ILIKE $1 ESCAPE '\\' \
                        OR EXISTS (SELECT 1 FROM unnest(v.tags) AS t(tag) \
                                   WHERE lower(t.tag) = lower($2)))) \
             SELECT * FROM s \
             WHERE $5::BIGINT IS NULL \
                OR (s.view_count, s.created_at, s.id) < ($3::BIGINT, $4::TIMESTAMPTZ, $5::BIGINT) \
             ORDER BY s.view_count DESC, s.created_at DESC, s.id DESC \
             LIMIT $6"
        );
        sqlx::query_as::<_, VideoSummary>(&sql)
            .bind(&pattern)
            .bind(query)
            .bind(cursor.map(|c| c.view_count))
            .bind(cursor.map(|c| c.created_at))
            .bind(cursor.map(|c| c.id))
            .bind(fetch)
            .fetch_all(pool)
            .await
    }

    /// Replace title, description, game type and tags.
    ///
    /// Returns `None` if no video with the given ID exists.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        meta: &ValidMetadata,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET title = $2, description = $3, game_type = $4, tags = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&meta.title)
            .bind(&meta.description)
            .bind(&meta.game_type)
            .bind(&meta.tags)
            .fetch_optional(pool)
            .await
    }

    /// Replace the thumbnail setting (all three columns at once).
    pub async fn update_thumbnail(
        pool: &PgPool,
        id: DbId,
        thumbnail: &ThumbnailSetting,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET thumbnail_source = $2, thumbnail_timestamp = $3, \
                               custom_thumbnail_key = $4 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(thumbnail.source().as_str())
            .bind(thumbnail.timestamp_secs())
            .bind(thumbnail.custom_key())
            .fetch_optional(pool)
            .await
    }

    /// Store the latest transcoding status and (when known) duration.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: VideoStatus,
        duration_secs: Option<f64>,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET status = $2, duration_secs = COALESCE($3, duration_secs) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(duration_secs)
            .fetch_optional(pool)
            .await
    }

    /// Delete a video. Likes, favorites, comments and views cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
