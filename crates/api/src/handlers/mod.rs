pub mod comments;
pub mod interactions;
pub mod posts;
pub mod uploads;
pub mod users;
pub mod videos;
