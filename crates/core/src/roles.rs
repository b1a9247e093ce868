//! Roles and the authorization policy table.
//!
//! Role names must match the `ck_users_role` constraint in
//! `20261001000002_create_users_table.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_VIEWER: &str = "viewer";

/// Closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Viewer,
}

impl Role {
    /// Parse from the stored / claimed role name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_MODERATOR => Ok(Self::Moderator),
            ROLE_VIEWER => Ok(Self::Viewer),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Moderator => ROLE_MODERATOR,
            Self::Viewer => ROLE_VIEWER,
        }
    }
}

/// Everything a caller can attempt that needs a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PublishVideo,
    EditVideo,
    DeleteVideo,
    CreatePost,
    DeletePost,
    Comment,
    DeleteComment,
    React,
    UploadMedia,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Self::PublishVideo => "publish videos",
            Self::EditVideo => "edit this video",
            Self::DeleteVideo => "delete videos",
            Self::CreatePost => "create posts",
            Self::DeletePost => "delete posts",
            Self::Comment => "comment",
            Self::DeleteComment => "delete this comment",
            Self::React => "react",
            Self::UploadMedia => "upload media",
        }
    }
}

/// The single (role, action) policy table.
///
/// `is_owner` is only consulted for actions on an existing resource
/// (editing a video, deleting a comment).
pub fn authorize(role: Role, action: Action, is_owner: bool) -> bool {
    use Action::*;
    use Role::*;

    match (action, role) {
        (_, Admin) => true,
        (PublishVideo, Moderator) => true,
        (EditVideo, Moderator) => is_owner,
        (DeleteComment, Moderator) => true,
        (DeleteComment, Viewer) => is_owner,
        (Comment | React | UploadMedia, _) => true,
        _ => false,
    }
}

/// Like [`authorize`] but maps a denial to [`CoreError::Forbidden`].
pub fn ensure_allowed(role: Role, action: Action, is_owner: bool) -> Result<(), CoreError> {
    if authorize(role, action, is_owner) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Your role is not allowed to {}",
            action.label()
        )))
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    /// Check `action` against the policy table; `owner_id` is the owner of
    /// the resource acted on, if any.
    pub fn ensure(&self, action: Action, owner_id: Option<DbId>) -> Result<(), CoreError> {
        ensure_allowed(self.role, action, owner_id == Some(self.user_id))
    }
}
