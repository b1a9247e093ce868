//! Handlers for video comments.
//!
//! Threads are one level deep: a reply must target a top-level comment of
//! the same video. The rule is checked here first and backed by a database
//! trigger for concurrent writers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vidhub_core::comment::{validate_content, validate_reply_target};
use vidhub_core::error::CoreError;
use vidhub_core::roles::Action;
use vidhub_core::types::DbId;
use vidhub_db::listing;
use vidhub_db::models::comment::CreateComment;
use vidhub_db::repositories::{CommentRepo, VideoRepo};

use crate::error::{AppError, AppResult, ListError};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::CommentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /videos/{id}/comments`.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    /// Top-level comment being replied to.
    pub parent_id: Option<DbId>,
}

/// GET /api/v1/videos/{id}/comments
///
/// One thread level, newest first. Without `parent_id` only top-level
/// comments are returned.
pub async fn list_comments(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    params: Result<Query<CommentListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ListError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let page = listing::list_comments(
        &state.pool,
        &state.urls,
        video_id,
        viewer.user_id(),
        params.cursor,
        params.parent_id,
    )
    .await?;

    Ok(Json(DataResponse::new(page)))
}

/// POST /api/v1/videos/{id}/comments
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    auth.actor().ensure(Action::Comment, None)?;
    let content = validate_content(&input.content)?;

    if let Some(parent_id) = input.parent_id {
        let parent = CommentRepo::find_by_id(&state.pool, parent_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Comment",
                id: parent_id,
            }))?;
        validate_reply_target(video_id, parent.video_id, parent.parent_id)?;
    } else if VideoRepo::find_by_id(&state.pool, video_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }));
    }

    let comment = CommentRepo::create(
        &state.pool,
        &CreateComment {
            video_id,
            user_id: auth.user_id,
            content,
            parent_id: input.parent_id,
        },
    )
    .await?;

    tracing::info!(
        comment_id = comment.id,
        video_id,
        parent_id = ?comment.parent_id,
        user_id = auth.user_id,
        "Comment created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse::new(comment))))
}

/// DELETE /api/v1/comments/{id}
///
/// Authors may delete their own comments; moderators and admins any.
/// Replies go with their parent.
pub async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id: comment_id,
        })
    };

    let comment = CommentRepo::find_by_id(&state.pool, comment_id)
        .await?
        .ok_or_else(not_found)?;
    auth.actor()
        .ensure(Action::DeleteComment, Some(comment.user_id))?;

    if !CommentRepo::delete(&state.pool, comment_id).await? {
        return Err(not_found());
    }

    tracing::info!(comment_id, user_id = auth.user_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
