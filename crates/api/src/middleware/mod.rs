//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous requests are allowed.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequirePublisher`] -- Requires `moderator` or `admin` role.

pub mod auth;
pub mod rbac;
