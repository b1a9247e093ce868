//! Comment validation and the one-level reply rule.

use crate::error::CoreError;
use crate::types::DbId;

pub const MAX_COMMENT_CHARS: usize = 2000;

/// Fixed page size for comment listing.
pub const COMMENT_PAGE_SIZE: i64 = 10;

/// Error message for attempts to reply to a reply.
pub const REPLY_TO_REPLY_MESSAGE: &str = "Cannot reply to a reply.";

/// Trim and validate comment content.
pub fn validate_content(content: &str) -> Result<String, CoreError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::Validation("Comment cannot be empty".into()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(CoreError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

/// Check that a reply target is itself top-level.
///
/// `parent_video_id` / `parent_parent_id` describe the comment being replied
/// to. A reply is never re-parented to the thread root; it is rejected.
pub fn validate_reply_target(
    video_id: DbId,
    parent_video_id: DbId,
    parent_parent_id: Option<DbId>,
) -> Result<(), CoreError> {
    if parent_parent_id.is_some() {
        return Err(CoreError::Validation(REPLY_TO_REPLY_MESSAGE.into()));
    }
    if parent_video_id != video_id {
        return Err(CoreError::Validation(
            "Parent comment belongs to a different video".into(),
        ));
    }
    Ok(())
}
