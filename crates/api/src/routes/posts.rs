use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{interactions, posts};
use crate::state::AppState;

/// Community post routes mounted at `/posts`.
///
/// ```text
/// GET    /                    -> list_posts
/// POST   /                    -> create_post (multipart, admin only)
/// DELETE /{id}                -> delete_post (admin only)
/// POST   /{id}/like           -> toggle_post_like
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts).post(posts::create_post))
        .route("/{id}", delete(posts::delete_post))
        .route("/{id}/like", post(interactions::toggle_post_like))
}
