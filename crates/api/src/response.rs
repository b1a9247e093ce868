//! Shared response envelope for API handlers.
//!
//! Every successful response is `{ "success": true, "data": ... }`. Errors
//! use the matching `{ "success": false, "error": ..., "code": ... }` shape
//! produced by [`crate::error::AppError`].

use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse::new(items)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
