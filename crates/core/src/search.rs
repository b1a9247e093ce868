//! Video search constants and query helpers.
//!
//! Matching rules:
//!
//! - title, description and uploader name: case-insensitive substring match;
//! - tags: case-insensitive equality between the *whole* query and one tag.
//!
//! Tags are discrete labels, so a query only hits a tag when it names it
//! exactly ("fps" matches the tag "FPS" but not "fps-tips").

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Default number of search results per page.
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// Maximum number of search results per page.
pub const MAX_SEARCH_LIMIT: i64 = 50;

/// Trim a free-text query. Returns `None` for empty or whitespace-only input,
/// in which case no search should be run at all.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Escape `LIKE` metacharacters (`\`, `%`, `_`) and wrap in `%…%` for a
/// substring match. Use with `ILIKE $n ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Whether `query` hits one of `tags` under the whole-tag rule.
///
/// The SQL search applies the same rule; this is the reference used by
/// tests and by in-memory filtering.
pub fn tag_matches(tags: &[String], query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    tags.iter().any(|t| t.to_lowercase() == needle)
}

/// Continuation point in the search ordering
/// (`view_count DESC, created_at DESC, id DESC`).
///
/// The cursor carries the sort key of the last row shown, so the next page
/// does not depend on that row still existing. It travels as the opaque
/// token `<view_count>:<created_at micros>:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCursor {
    pub view_count: i64,
    pub created_at: Timestamp,
    pub id: DbId,
}

impl fmt::Display for SearchCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.view_count,
            self.created_at.timestamp_micros(),
            self.id
        )
    }
}

impl FromStr for SearchCursor {
    type Err = CoreError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid search cursor '{token}'"));

        let mut parts = token.split(':');
        let (Some(views), Some(micros), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let view_count = views.parse::<i64>().map_err(|_| invalid())?;
        let micros = micros.parse::<i64>().map_err(|_| invalid())?;
        let id = id.parse::<DbId>().map_err(|_| invalid())?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;

        Ok(Self {
            view_count,
            created_at,
            id,
        })
    }
}

impl Serialize for SearchCursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SearchCursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
