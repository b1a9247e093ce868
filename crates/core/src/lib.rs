//! Domain rules shared by every vidhub crate.
//!
//! Nothing in here touches the network or the database: enums, validation,
//! pagination trimming, object-key naming, public URL construction, and the
//! role/action authorization table.

pub mod comment;
pub mod error;
pub mod media;
pub mod pagination;
pub mod post;
pub mod roles;
pub mod search;
pub mod storage_keys;
pub mod types;
pub mod urls;
pub mod video;
