//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod like_repo;
pub mod post_repo;
pub mod upload_target_repo;
pub mod user_repo;
pub mod video_repo;
pub mod video_view_repo;

pub use comment_repo::CommentRepo;
pub use like_repo::LikeRepo;
pub use post_repo::PostRepo;
pub use upload_target_repo::UploadTargetRepo;
pub use user_repo::UserRepo;
pub use video_repo::VideoRepo;
pub use video_view_repo::VideoViewRepo;
