//! Reaction join tables (likes, favorites).

use serde::Serialize;

/// Which reaction table a toggle targets.
///
/// Table and column names are static so they can be spliced into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    VideoLike,
    Favorite,
    CommentLike,
    PostLike,
}

impl LikeKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::VideoLike => "video_likes",
            Self::Favorite => "video_favorites",
            Self::CommentLike => "comment_likes",
            Self::PostLike => "post_likes",
        }
    }

    pub fn subject_column(self) -> &'static str {
        match self {
            Self::VideoLike | Self::Favorite => "video_id",
            Self::CommentLike => "comment_id",
            Self::PostLike => "post_id",
        }
    }
}

/// State after a toggle, with the count recomputed from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub is_liked: bool,
    pub count: i64,
}
