//! Translation of `sqlx` failures into the domain error taxonomy.

use quill_core::error::CoreError;

/// PostgreSQL `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE of a database-reported error, if any.
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Classify a `sqlx` error that a repository did not handle specifically.
///
/// - Unique violations become [`CoreError::AlreadyExists`].
/// - Connection-level failures (pool exhausted or closed, IO, TLS) become
///   [`CoreError::Unavailable`].
/// - Everything else is [`CoreError::Internal`].
pub fn db_error(err: sqlx::Error) -> CoreError {
    if sqlstate(&err).as_deref() == Some(UNIQUE_VIOLATION) {
        let constraint = match &err {
            sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or("unknown").to_string(),
            _ => "unknown".to_string(),
        };
        return CoreError::AlreadyExists(format!(
            "duplicate value violates unique constraint: {constraint}"
        ));
    }

    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            tracing::warn!(error = %err, "Database unavailable");
            CoreError::Unavailable(format!("database unavailable: {err}"))
        }
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Internal(format!("database error: {other}"))
        }
    }
}
