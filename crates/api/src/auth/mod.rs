//! Authentication primitives.
//!
//! Sessions are issued elsewhere; this service only verifies HS256 bearer
//! tokens ([`jwt`]).

pub mod jwt;
