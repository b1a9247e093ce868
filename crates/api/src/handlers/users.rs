//! Handlers for the caller's own profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use vidhub_core::error::CoreError;
use vidhub_core::types::{DbId, Timestamp};
use vidhub_core::urls::PublicUrls;
use vidhub_db::models::user::User;
use vidhub_db::repositories::UserRepo;
use vidhub_pipeline::icons::replace_user_icon;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 50;

/// The caller's profile with a resolved image URL.
#[derive(Debug, Serialize)]
pub struct Me {
    pub id: DbId,
    pub name: String,
    pub role: String,
    pub image_url: Option<String>,
    pub created_at: Timestamp,
}

impl Me {
    fn from_user(user: User, urls: &PublicUrls) -> Self {
        Self {
            image_url: user.image.as_deref().map(|image| urls.user_image(image)),
            id: user.id,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Request body for `PATCH /users/me`.
///
/// `image_key: null` clears the icon; an absent `image_key` leaves it alone.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub image_key: Option<Option<String>>,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// GET /api/v1/users/me
pub async fn get_me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(DataResponse::new(Me::from_user(user, &state.urls))))
}

/// PATCH /api/v1/users/me
///
/// Rename and/or point the icon at an object uploaded through
/// `/uploads/presign` with purpose `user_icon`. The previous icon object is
/// removed best-effort.
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateMeRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input.name.as_deref().map(validate_name).transpose()?;

    let mut user = None;
    if let Some(name) = name {
        user = UserRepo::update_name(&state.pool, auth.user_id, name).await?;
        if user.is_none() {
            return Err(user_not_found(auth.user_id));
        }
        tracing::info!(user_id = auth.user_id, "User renamed");
    }
    if let Some(image_key) = input.image_key {
        user = Some(
            replace_user_icon(
                &state.pool,
                state.storage.as_ref(),
                auth.user_id,
                image_key.as_deref(),
            )
            .await?,
        );
    }

    let user = match user {
        Some(user) => user,
        None => UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .ok_or_else(|| user_not_found(auth.user_id))?,
    };

    Ok(Json(DataResponse::new(Me::from_user(user, &state.urls))))
}

fn validate_name(name: &str) -> Result<&str, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

fn user_not_found(user_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "User",
        id: user_id,
    })
}
