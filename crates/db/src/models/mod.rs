//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Joined read models used by listings (author names, counts)
//! - `Create*` DTOs for inserts

pub mod comment;
pub mod like;
pub mod post;
pub mod user;
pub mod video;
