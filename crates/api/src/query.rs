//! Shared query parameter types for API handlers.

use quill_core::article::PageRequest;
use quill_core::error::CoreError;
use serde::Deserialize;

/// Page-number pagination (`?page=&page_size=`).
///
/// Omitted values fall back to page 1 and page size 10; explicit
/// non-positive values are rejected.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub fn to_page_request(&self) -> Result<PageRequest, CoreError> {
        PageRequest::from_optional(self.page, self.page_size)
    }
}
