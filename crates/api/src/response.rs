//! Small response bodies shared by several handlers.

use serde::Serialize;

/// `{ "success": true }` acknowledgement for mutations without a payload.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// `{ "liked": bool }` answer to a has-liked query.
#[derive(Debug, Serialize)]
pub struct LikedResponse {
    pub liked: bool,
}
