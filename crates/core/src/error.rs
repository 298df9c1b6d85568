//! Error taxonomy surfaced by every component of the article service.

/// Domain error shared by the relational store, the object store adapter,
/// the identity resolver and the orchestrator.
///
/// Components return these unchanged; only the transport layer decides how a
/// variant is rendered to a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A required field is missing or a parameter is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected the write (e.g. a duplicate like).
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The operation requires state that is not present (e.g. unlike without a like).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// An external service or transport could not be reached.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::FailedPrecondition(_) => "FAILED_PRECONDITION",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = CoreError::not_found("Article", "abc");
        assert_eq!(err.to_string(), "Entity not found: Article with id abc");
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            CoreError::InvalidArgument(String::new()).kind(),
            CoreError::not_found("x", 1).kind(),
            CoreError::AlreadyExists(String::new()).kind(),
            CoreError::FailedPrecondition(String::new()).kind(),
            CoreError::Unavailable(String::new()).kind(),
            CoreError::Internal(String::new()).kind(),
        ];
        let mut sorted = kinds.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), kinds.len());
    }
}
