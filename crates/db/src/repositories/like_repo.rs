//! Repository for the reaction join tables.
//!
//! All four tables share one shape: `(id, <subject>_id, user_id, timestamps)`
//! with a unique constraint on `(<subject>_id, user_id)`, so one set of
//! queries serves every [`LikeKind`].

use sqlx::PgPool;
use vidhub_core::types::DbId;

use crate::models::like::{LikeKind, ToggleOutcome};

/// Provides toggle, count, and annotation queries for reactions.
pub struct LikeRepo;

impl LikeRepo {
    /// Flip the user's reaction on a subject and return the new state.
    ///
    /// An existing row is deleted; otherwise a row is inserted with
    /// `ON CONFLICT DO NOTHING`, so a concurrent insert from a double click
    /// cannot produce a duplicate or an error. The count is recomputed from
    /// the table after the write.
    pub async fn toggle(
        pool: &PgPool,
        kind: LikeKind,
        subject_id: DbId,
        user_id: DbId,
    ) -> Result<ToggleOutcome, sqlx::Error> {
        let table = kind.table();
        let column = kind.subject_column();

        let deleted = sqlx::query(&format!(
            "DELETE FROM {table} WHERE {column} = $1 AND user_id = $2"
        ))
        .bind(subject_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

        let is_liked = if deleted > 0 {
            false
        } else {
            sqlx::query(&format!(
                "INSERT INTO {table} ({column}, user_id) VALUES ($1, $2) \
                 ON CONFLICT ({column}, user_id) DO NOTHING"
            ))
            .bind(subject_id)
            .bind(user_id)
            .execute(pool)
            .await?;
            true
        };

        let count = Self::count(pool, kind, subject_id).await?;
        Ok(ToggleOutcome { is_liked, count })
    }

    /// Number of reactions of this kind on a subject.
    pub async fn count(pool: &PgPool, kind: LikeKind, subject_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            kind.table(),
            kind.subject_column()
        ))
        .bind(subject_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Whether the user has reacted to the subject.
    pub async fn is_liked(
        pool: &PgPool,
        kind: LikeKind,
        subject_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1 AND user_id = $2)",
            kind.table(),
            kind.subject_column()
        ))
        .bind(subject_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// The subset of `subject_ids` the user has reacted to.
    pub async fn liked_ids(
        pool: &PgPool,
        kind: LikeKind,
        user_id: DbId,
        subject_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if subject_ids.is_empty() {
            return Ok(Vec::new());
        }
        let column = kind.subject_column();
        let rows: Vec<(DbId,)> = sqlx::query_as(&format!(
            "SELECT {column} FROM {} WHERE user_id = $1 AND {column} = ANY($2)",
            kind.table()
        ))
        .bind(user_id)
        .bind(subject_ids)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
