//! Article identifiers, required-field validation, and pagination.
//!
//! The relational store calls these before touching the database so that
//! malformed requests fail with [`CoreError::InvalidArgument`] without a
//! round trip.

use uuid::Uuid;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Page used when a list request does not specify one.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when a list request does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Mint a new article id.
///
/// UUIDv7 embeds a millisecond timestamp followed by a counter, so ids sort
/// lexicographically by creation time, are monotonic within this process,
/// and stay unique across processes through the random tail.
pub fn new_article_id() -> DbId {
    Uuid::now_v7()
}

/// Parse an article id received as text.
///
/// Empty, malformed and nil ids are all rejected as invalid arguments.
pub fn parse_article_id(raw: &str) -> Result<DbId, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidArgument("article_id is required".into()));
    }
    let id = Uuid::parse_str(trimmed)
        .map_err(|_| CoreError::InvalidArgument(format!("'{trimmed}' is not a valid article_id")))?;
    require_id("article_id", id)?;
    Ok(id)
}

/// Reject the nil UUID, which stands in for an absent id.
pub fn require_id(field: &str, id: DbId) -> Result<(), CoreError> {
    if id.is_nil() {
        Err(CoreError::InvalidArgument(format!("{field} is required")))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Required fields
// ---------------------------------------------------------------------------

/// Ensure every `(name, value)` pair is non-blank.
///
/// All missing fields are reported together, e.g.
/// `"author_id, title are required"`.
pub fn require_fields(fields: &[(&str, &str)]) -> Result<(), CoreError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    match missing.as_slice() {
        [] => Ok(()),
        [one] => Err(CoreError::InvalidArgument(format!("{one} is required"))),
        many => Err(CoreError::InvalidArgument(format!(
            "{} are required",
            many.join(", ")
        ))),
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Both `page` and `page_size` must be strictly positive.
    pub fn new(page: i64, page_size: i64) -> Result<Self, CoreError> {
        if page <= 0 || page_size <= 0 {
            return Err(CoreError::InvalidArgument(format!(
                "invalid pagination parameters: page={page}, page_size={page_size} (both must be positive)"
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Build from optional query values, falling back to the defaults.
    pub fn from_optional(page: Option<i64>, page_size: Option<i64>) -> Result<Self, CoreError> {
        Self::new(
            page.unwrap_or(DEFAULT_PAGE),
            page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL `OFFSET`, saturating for absurdly large pages.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn article_ids_are_unique_and_ordered() {
        let ids: Vec<DbId> = (0..1000).map(|_| new_article_id()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "ids must increase: {} !< {}", pair[0], pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn parse_article_id_accepts_valid_uuid() {
        let id = new_article_id();
        assert_eq!(parse_article_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_article_id(&format!("  {id} ")).unwrap(), id);
    }

    #[test]
    fn parse_article_id_rejects_empty_malformed_and_nil() {
        assert_matches!(parse_article_id(""), Err(CoreError::InvalidArgument(_)));
        assert_matches!(parse_article_id("   "), Err(CoreError::InvalidArgument(_)));
        assert_matches!(parse_article_id("not-a-uuid"), Err(CoreError::InvalidArgument(_)));
        assert_matches!(
            parse_article_id(&Uuid::nil().to_string()),
            Err(CoreError::InvalidArgument(_))
        );
    }

    #[test]
    fn require_fields_lists_every_missing_field() {
        assert!(require_fields(&[("author_id", "a"), ("title", "t")]).is_ok());

        let err = require_fields(&[("author_id", ""), ("title", " "), ("content", "c")]).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidArgument("author_id, title are required".into())
        );

        let err = require_fields(&[("content", "")]).unwrap_err();
        assert_eq!(err, CoreError::InvalidArgument("content is required".into()));
    }

    #[test]
    fn page_request_rejects_non_positive_values() {
        assert_matches!(PageRequest::new(0, 10), Err(CoreError::InvalidArgument(_)));
        assert_matches!(PageRequest::new(1, 0), Err(CoreError::InvalidArgument(_)));
        assert_matches!(PageRequest::new(-1, -1), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn page_request_offsets() {
        let first = PageRequest::new(1, 20).unwrap();
        assert_eq!((first.offset(), first.limit()), (0, 20));

        let third = PageRequest::new(3, 20).unwrap();
        assert_eq!(third.offset(), 40);

        let huge = PageRequest::new(i64::MAX, 2).unwrap();
        assert_eq!(huge.offset(), i64::MAX);
    }

    #[test]
    fn page_request_defaults() {
        let page = PageRequest::from_optional(None, None).unwrap();
        assert_eq!(page.page(), DEFAULT_PAGE);
        assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);
        assert_matches!(
            PageRequest::from_optional(Some(0), None),
            Err(CoreError::InvalidArgument(_))
        );
    }
}
