//! Repository for the `upload_targets` table.

use sqlx::PgPool;
use vidhub_core::types::DbId;

/// Remembers which user acquired each transcoder upload target.
pub struct UploadTargetRepo;

impl UploadTargetRepo {
    /// Record `user_id` as the owner of `asset_id`.
    ///
    /// Asset ids are unique; recording the same id twice is a
    /// `unique_violation`.
    pub async fn record(pool: &PgPool, asset_id: &str, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO upload_targets (asset_id, user_id) VALUES ($1, $2)")
            .bind(asset_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// The user who acquired `asset_id`, if this service issued it.
    pub async fn owner(pool: &PgPool, asset_id: &str) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT user_id FROM upload_targets WHERE asset_id = $1")
                .bind(asset_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(user_id,)| user_id))
    }
}
