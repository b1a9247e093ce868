//! Cursor pagination helpers.
//!
//! Every paginated list fetches `limit + 1` rows strictly after the cursor.
//! The extra row only signals that another page exists; it is never
//! returned and never becomes the next cursor.
//!
//! Most lists use the id of the last row as cursor. Lists whose sort key is
//! not implied by the id carry the key itself (see
//! [`crate::search::SearchCursor`]).

use serde::Serialize;

use crate::types::DbId;

/// One page of a cursor-paginated list.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T, C = DbId> {
    pub items: Vec<T>,
    /// Position of the last item in `items` when more rows exist.
    pub next_cursor: Option<C>,
    pub has_more: bool,
}

impl<T, C> Page<T, C> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// Trim an over-fetched result set (`limit + 1` rows) to a page.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64, cursor_of: impl Fn(&T) -> C) -> Self {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }
        let next_cursor = if has_more {
            rows.last().map(&cursor_of)
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
            has_more,
        }
    }

    /// Transform items while keeping the cursor fields.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U, C> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }
}

/// Number of rows to request for a page of `limit` items.
pub fn fetch_size(limit: i64) -> i64 {
    limit + 1
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}
