//! Handlers for the interaction toggles (likes and favorites).
//!
//! Every toggle answers with the state after the flip and the count
//! recomputed from storage, never a client-side delta. Anonymous callers get
//! a 401 whose body carries `requires_auth: true`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use vidhub_core::roles::Action;
use vidhub_core::types::DbId;
use vidhub_db::models::like::LikeKind;
use vidhub_db::repositories::LikeRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/videos/{id}/like
pub async fn toggle_video_like(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    toggle(&state, auth, LikeKind::VideoLike, video_id).await
}

/// POST /api/v1/videos/{id}/favorite
pub async fn toggle_favorite(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    toggle(&state, auth, LikeKind::Favorite, video_id).await
}

/// POST /api/v1/comments/{id}/like
pub async fn toggle_comment_like(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    toggle(&state, auth, LikeKind::CommentLike, comment_id).await
}

/// POST /api/v1/posts/{id}/like
pub async fn toggle_post_like(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    toggle(&state, auth, LikeKind::PostLike, post_id).await
}

/// A missing subject surfaces as the foreign key violation on insert (404).
async fn toggle(
    state: &AppState,
    auth: AuthUser,
    kind: LikeKind,
    subject_id: DbId,
) -> AppResult<impl IntoResponse> {
    auth.actor().ensure(Action::React, None)?;

    let outcome = LikeRepo::toggle(&state.pool, kind, subject_id, auth.user_id).await?;

    tracing::info!(
        subject_id,
        user_id = auth.user_id,
        table = kind.table(),
        is_liked = outcome.is_liked,
        count = outcome.count,
        "Reaction toggled",
    );

    Ok(Json(DataResponse::new(outcome)))
}
