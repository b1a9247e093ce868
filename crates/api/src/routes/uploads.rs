use axum::routing::post;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Direct-to-storage upload routes mounted at `/uploads`.
///
/// ```text
/// POST   /presign             -> presign_upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/presign", post(uploads::presign_upload))
}
