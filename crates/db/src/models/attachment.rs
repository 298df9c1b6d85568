//! Attachment index model.
//!
//! Rows move `pending` -> `committed` once the blob is written, or to
//! `orphaned` when the blob must be reclaimed (failed upload or deleted
//! article). Orphaned rows are removed by the cleanup worker after their blob
//! is gone.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quill_core::types::{DbId, Timestamp};

/// Lifecycle state stored in `article_attachments.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentState {
    Pending,
    Committed,
    Orphaned,
}

impl AttachmentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::Orphaned => "orphaned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "committed" => Some(Self::Committed),
            "orphaned" => Some(Self::Orphaned),
            _ => None,
        }
    }
}

/// A row from the `article_attachments` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Attachment {
    pub storage_key: String,
    pub article_id: DbId,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub state: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Attachment {
    /// Parsed [`AttachmentState`]; `None` only if the row holds an unknown value.
    pub fn state(&self) -> Option<AttachmentState> {
        AttachmentState::parse(&self.state)
    }
}

/// DTO for recording the intent to store a blob.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub storage_key: String,
    pub article_id: DbId,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_text() {
        for state in [
            AttachmentState::Pending,
            AttachmentState::Committed,
            AttachmentState::Orphaned,
        ] {
            assert_eq!(AttachmentState::parse(state.as_str()), Some(state));
        }
        assert_eq!(AttachmentState::parse("deleted"), None);
    }
}
