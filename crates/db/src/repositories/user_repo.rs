//! Repository for the `users` table.

use sqlx::PgPool;
use vidhub_core::types::DbId;

use crate::models::user::{CreateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, name, image, role, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, image, role) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.image)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    /// Find a user by their ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Rename a user. Returns `None` if the user does not exist.
    pub async fn update_name(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("UPDATE users SET name = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Swap the stored image, returning the previous value alongside the
    /// updated row so the caller can clean up the old object.
    pub async fn replace_image(
        pool: &PgPool,
        id: DbId,
        image: Option<&str>,
    ) -> Result<Option<(User, Option<String>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<(Option<String>,)> =
            sqlx::query_as("SELECT image FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((previous,)) = previous else {
            tx.rollback().await?;
            return Ok(None);
        };

        let query = format!("UPDATE users SET image = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(image)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((user, previous)))
    }
}
