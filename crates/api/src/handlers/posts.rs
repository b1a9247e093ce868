//! Handlers for community posts.
//!
//! Posts are written by admins through a multipart form carrying up to four
//! images; everyone can read and like them.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use vidhub_core::pagination::clamp_limit;
use vidhub_core::post::{DEFAULT_POST_LIMIT, MAX_POST_LIMIT};
use vidhub_core::types::DbId;
use vidhub_db::listing;
use vidhub_db::models::post::Post;
use vidhub_pipeline::ImageUpload;

use crate::error::{AppError, AppResult, ListError};
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::CursorParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A freshly created post with the public URLs of its images.
#[derive(Debug, Serialize)]
pub struct CreatedPost {
    #[serde(flatten)]
    pub post: Post,
    pub image_urls: Vec<String>,
}

/// GET /api/v1/posts
pub async fn list_posts(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    params: Result<Query<CursorParams>, QueryRejection>,
) -> Result<impl IntoResponse, ListError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limit = clamp_limit(params.limit, DEFAULT_POST_LIMIT, MAX_POST_LIMIT);

    let page = listing::list_posts(
        &state.pool,
        &state.urls,
        viewer.user_id(),
        params.cursor,
        limit,
    )
    .await?;

    Ok(Json(DataResponse::new(page)))
}

/// POST /api/v1/posts
///
/// Multipart fields: `content` (text) and `images` (image file, repeated,
/// kept in the order sent).
pub async fn create_post(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut content: Option<String> = None;
    let mut images: Vec<ImageUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("content") => {
                content = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            Some("images") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                images.push(ImageUpload {
                    bytes,
                    content_type,
                });
            }
            _ => {}
        }
    }

    let content =
        content.ok_or_else(|| AppError::BadRequest("Missing multipart field 'content'".into()))?;

    let published = state
        .posts
        .create_post(&admin.actor(), &content, images)
        .await?;

    let image_urls = published
        .image_keys
        .iter()
        .map(|key| state.urls.object(key))
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(CreatedPost {
            post: published.post,
            image_urls,
        })),
    ))
}

/// DELETE /api/v1/posts/{id}
///
/// Admin only. Image objects are removed after the row; failures there are
/// logged and do not fail the request.
pub async fn delete_post(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.posts.delete_post(post_id, &admin.actor()).await?;

    Ok(StatusCode::NO_CONTENT)
}
