//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidhub_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    /// Object-store key (`user_icons/...`) or external URL.
    pub image: Option<String>,
    /// Role name (`"admin"`, `"moderator"`, `"viewer"`).
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub image: Option<String>,
    pub role: String,
}
