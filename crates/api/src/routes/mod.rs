pub mod comments;
pub mod health;
pub mod posts;
pub mod uploads;
pub mod users;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                                  health (public)
///
/// /videos                                  list (GET), finalize upload (POST)
/// /videos/search                           search (GET)
/// /videos/upload-target                    reserve a resumable upload (POST)
/// /videos/publish                          one-shot multipart publish (POST)
/// /videos/{id}                             detail, edit metadata, delete
/// /videos/{id}/thumbnail                   replace thumbnail (PUT)
/// /videos/{id}/status                      refresh transcoding status (GET)
/// /videos/{id}/views                       record a view (POST)
/// /videos/{id}/like                        toggle like (POST)
/// /videos/{id}/favorite                    toggle favorite (POST)
/// /videos/{id}/comments                    list, create
///
/// /comments/{id}                           delete
/// /comments/{id}/like                      toggle like (POST)
///
/// /posts                                   list, create (multipart, admin)
/// /posts/{id}                              delete (admin)
/// /posts/{id}/like                         toggle like (POST)
///
/// /uploads/presign                         presigned PUT for images (POST)
///
/// /users/me                                current user (GET, PATCH)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/posts", posts::router())
        .nest("/uploads", uploads::router())
        .nest("/users", users::router())
}
