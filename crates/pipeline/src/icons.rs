//! User icon replacement.

use sqlx::PgPool;
use vidhub_cloud::StorageGateway;
use vidhub_core::error::CoreError;
use vidhub_core::storage_keys::{is_user_icon_key, validate_key_for, KeyPurpose};
use vidhub_core::types::DbId;
use vidhub_db::models::user::User;
use vidhub_db::repositories::UserRepo;

use crate::error::PipelineResult;

/// Point the user's image at `new_key` (an object the client uploaded with a
/// presigned URL) or clear it with `None`.
///
/// The previous image object is deleted afterwards when it was one of ours
/// and differs from the new one. That deletion is best-effort.
pub async fn replace_user_icon(
    pool: &PgPool,
    storage: &dyn StorageGateway,
    user_id: DbId,
    new_key: Option<&str>,
) -> PipelineResult<User> {
    if let Some(key) = new_key {
        validate_key_for(KeyPurpose::UserIcon(user_id), key)?;
    }

    let (user, previous) = UserRepo::replace_image(pool, user_id, new_key)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

    if let Some(old) = previous.filter(|old| is_user_icon_key(old) && Some(old.as_str()) != new_key) {
        if let Err(e) = storage.delete_object(&old).await {
            tracing::warn!(user_id, key = %old, error = %e, "Failed to delete previous user icon");
        }
    }

    tracing::info!(user_id, "User icon updated");
    Ok(user)
}
