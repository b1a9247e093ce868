//! Route definitions for the `/videos` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{comments, interactions, videos};
use crate::state::AppState;

/// Video routes mounted at `/videos`.
///
/// ```text
/// GET    /                    -> list_videos
/// POST   /                    -> create_video (finalize a direct upload)
/// GET    /search              -> search_videos
/// POST   /upload-target       -> create_upload_target
/// POST   /publish             -> publish_video (multipart)
/// GET    /{id}                -> get_video
/// PATCH  /{id}                -> update_video
/// DELETE /{id}                -> delete_video (admin only)
/// PUT    /{id}/thumbnail      -> update_thumbnail
/// GET    /{id}/status         -> refresh_status
/// POST   /{id}/views          -> record_view
/// POST   /{id}/like           -> toggle_video_like
/// POST   /{id}/favorite       -> toggle_favorite
/// GET    /{id}/comments       -> list_comments
/// POST   /{id}/comments       -> create_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list_videos).post(videos::create_video))
        .route("/search", get(videos::search_videos))
        .route("/upload-target", post(videos::create_upload_target))
        .route("/publish", post(videos::publish_video))
        .route(
            "/{id}",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/{id}/thumbnail", put(videos::update_thumbnail))
        .route("/{id}/status", get(videos::refresh_status))
        .route("/{id}/views", post(videos::record_view))
        .route("/{id}/like", post(interactions::toggle_video_like))
        .route("/{id}/favorite", post(interactions::toggle_favorite))
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
}
