//! Object-store key naming.
//!
//! Keys are namespaced by purpose:
//!
//! ```text
//! posts/<ts>-<rand>-<index>.<ext>
//! thumbnails/<videoType>/<ts>-<rand>.<ext>
//! user_icons/<userId>-<ts>-<rand>.<ext>
//! ```
//!
//! `<ts>` is the UTC Unix time in milliseconds, `<rand>` eight lowercase
//! alphanumerics.

use rand::distr::{Alphanumeric, SampleString};

use crate::error::CoreError;
use crate::types::DbId;
use crate::video::VideoType;

const RANDOM_SUFFIX_LEN: usize = 8;

/// What an uploaded object is for; decides its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    PostImage { index: usize },
    Thumbnail(VideoType),
    UserIcon(DbId),
}

impl KeyPurpose {
    /// Key prefix every object of this purpose must start with.
    pub fn prefix(self) -> String {
        match self {
            Self::PostImage { .. } => "posts/".to_string(),
            Self::Thumbnail(video_type) => format!("thumbnails/{}/", video_type.as_str()),
            Self::UserIcon(user_id) => format!("user_icons/{user_id}-"),
        }
    }
}

fn random_suffix() -> String {
    Alphanumeric
        .sample_string(&mut rand::rng(), RANDOM_SUFFIX_LEN)
        .to_lowercase()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build a fresh, collision-resistant key for `purpose`.
pub fn new_key(purpose: KeyPurpose, ext: &str) -> String {
    let ts = now_millis();
    let rand = random_suffix();
    match purpose {
        KeyPurpose::PostImage { index } => format!("posts/{ts}-{rand}-{index}.{ext}"),
        KeyPurpose::Thumbnail(_) | KeyPurpose::UserIcon(_) => {
            format!("{}{ts}-{rand}.{ext}", purpose.prefix())
        }
    }
}

/// Check that a client-supplied key points into `purpose`'s namespace.
///
/// Used when a client uploads directly with a presigned URL and then hands
/// the key back.
pub fn validate_key_for(purpose: KeyPurpose, key: &str) -> Result<(), CoreError> {
    let prefix = purpose.prefix();
    let valid = key.starts_with(&prefix)
        && key.len() > prefix.len()
        && !key.contains("..")
        && !key.contains("//")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Object key must start with '{prefix}'"
        )))
    }
}

/// Whether a stored user image is one of our objects (as opposed to an
/// external avatar URL).
pub fn is_user_icon_key(image: &str) -> bool {
    image.starts_with("user_icons/")
}
