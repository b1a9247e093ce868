use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::{comments, interactions};
use crate::state::AppState;

/// Comment routes mounted at `/comments`.
///
/// ```text
/// DELETE /{id}                -> delete_comment
/// POST   /{id}/like           -> toggle_comment_like
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(comments::delete_comment))
        .route("/{id}/like", post(interactions::toggle_comment_like))
}
