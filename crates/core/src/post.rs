//! Community post validation.

use crate::error::CoreError;

pub const MAX_POST_CHARS: usize = 1000;
pub const MAX_POST_IMAGES: usize = 4;

/// Default page size for post listing.
pub const DEFAULT_POST_LIMIT: i64 = 10;

/// Maximum page size for post listing.
pub const MAX_POST_LIMIT: i64 = 50;

/// Trim and validate post content and image count.
pub fn validate_post(content: &str, image_count: usize) -> Result<String, CoreError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::Validation("Post content is required".into()));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(CoreError::Validation(format!(
            "Post must be at most {MAX_POST_CHARS} characters"
        )));
    }
    if image_count > MAX_POST_IMAGES {
        return Err(CoreError::Validation(format!(
            "A post can have at most {MAX_POST_IMAGES} images"
        )));
    }
    Ok(content.to_string())
}
