//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement. Ownership rules live in the policy table
//! (`vidhub_core::roles`) and are checked by the pipeline once the resource
//! is loaded.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vidhub_core::error::CoreError;
use vidhub_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     // user is guaranteed to be an admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `moderator` or `admin` role. Rejects with 403 Forbidden otherwise.
///
/// Used on the video publish routes so a viewer's multipart body is refused
/// before it is buffered.
pub struct RequirePublisher(pub AuthUser);

impl FromRequestParts<AppState> for RequirePublisher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !matches!(user.role, Role::Admin | Role::Moderator) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Moderator or Admin role required".into(),
            )));
        }
        Ok(RequirePublisher(user))
    }
}
