use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quill_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from the orchestrator or a store.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A malformed request (bad multipart body, unreadable field).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] to an HTTP status, stable error code and message.
///
/// Internal messages are logged and replaced with a generic one.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    let status = match err {
        CoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::AlreadyExists(_) => StatusCode::CONFLICT,
        CoreError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
        CoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.kind(),
                "An internal error occurred".to_string(),
            );
        }
    };
    (status, err.kind(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (CoreError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::not_found("Article", "1"), StatusCode::NOT_FOUND),
            (CoreError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (CoreError::FailedPrecondition("x".into()), StatusCode::PRECONDITION_FAILED),
            (CoreError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(classify_core_error(&err).0, expected, "{err:?}");
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let (_, code, message) = classify_core_error(&CoreError::Internal("pg: relation missing".into()));
        assert_eq!(code, "INTERNAL");
        assert_eq!(message, "An internal error occurred");
    }
}
