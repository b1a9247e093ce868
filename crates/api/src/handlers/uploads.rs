//! Presigned direct-to-storage uploads.
//!
//! The server only mints the key and the signed URL; the bytes never pass
//! through it. The key is later handed back (thumbnail selection, user icon)
//! and re-validated against its namespace there.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use vidhub_cloud::PresignedUpload;
use vidhub_core::error::CoreError;
use vidhub_core::media::image_extension;
use vidhub_core::post::MAX_POST_IMAGES;
use vidhub_core::roles::Action;
use vidhub_core::storage_keys::{new_key, KeyPurpose};
use vidhub_core::video::VideoType;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// What the uploaded object will be used for.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum UploadPurpose {
    Thumbnail { video_type: VideoType },
    PostImage { index: usize },
    UserIcon,
}

/// Request body for `POST /uploads/presign`.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    #[serde(flatten)]
    pub purpose: UploadPurpose,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct PresignResponse {
    #[serde(flatten)]
    pub upload: PresignedUpload,
    /// Where the object will be readable once uploaded.
    pub public_url: String,
}

/// POST /api/v1/uploads/presign
pub async fn presign_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PresignRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = auth.actor();
    actor.ensure(Action::UploadMedia, None)?;

    let purpose = match input.purpose {
        UploadPurpose::Thumbnail { video_type } => {
            actor.ensure(Action::PublishVideo, None)?;
            KeyPurpose::Thumbnail(video_type)
        }
        UploadPurpose::PostImage { index } => {
            actor.ensure(Action::CreatePost, None)?;
            if index >= MAX_POST_IMAGES {
                return Err(CoreError::Validation(format!(
                    "Post image index must be below {MAX_POST_IMAGES}"
                ))
                .into());
            }
            KeyPurpose::PostImage { index }
        }
        UploadPurpose::UserIcon => KeyPurpose::UserIcon(auth.user_id),
    };

    let ext = image_extension(&input.content_type)?;
    let key = new_key(purpose, ext);
    let upload = state
        .storage
        .issue_presigned_upload(&key, &input.content_type, state.presign_ttl)
        .await
        .map_err(CoreError::from)?;

    tracing::info!(user_id = auth.user_id, key = %upload.key, "Presigned upload issued");

    let public_url = state.urls.object(&upload.key);
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(PresignResponse { upload, public_url })),
    ))
}
