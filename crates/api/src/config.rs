use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except
/// `database_url`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `7878`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on waiting for background tasks after the listener closes.
    pub shutdown_timeout_secs: u64,
    pub database_url: String,
    /// Pool size (default: `20`).
    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `7878`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `DATABASE_URL`          | (required)              |
    /// | `DB_MAX_CONNECTIONS`    | `20`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        Self {
            host,
            port: env_or("PORT", 7878),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", quill_db::DEFAULT_MAX_CONNECTIONS),
        }
    }
}

/// Tuning for the attachment cleanup worker and reconciler.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Bounded capacity of the cleanup task queue.
    pub queue_capacity: usize,
    /// Blob delete attempts per task before giving up until the next sweep.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// How often the reconciler sweeps the attachment index.
    pub reconcile_interval: Duration,
    /// Age after which a `pending` or `orphaned` row is considered abandoned.
    pub pending_grace: Duration,
    /// Rows re-enqueued per sweep.
    pub batch_size: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(10_000),
            reconcile_interval: Duration::from_secs(300),
            pending_grace: Duration::from_secs(900),
            batch_size: 200,
        }
    }
}

impl CleanupConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `CLEANUP_QUEUE_CAPACITY`       | `1024`  |
    /// | `CLEANUP_MAX_ATTEMPTS`         | `5`     |
    /// | `CLEANUP_INITIAL_BACKOFF_MS`   | `200`   |
    /// | `CLEANUP_MAX_BACKOFF_MS`       | `10000` |
    /// | `RECONCILE_INTERVAL_SECS`      | `300`   |
    /// | `RECONCILE_PENDING_GRACE_SECS` | `900`   |
    /// | `RECONCILE_BATCH_SIZE`         | `200`   |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            queue_capacity: env_or("CLEANUP_QUEUE_CAPACITY", defaults.queue_capacity),
            max_attempts: env_or("CLEANUP_MAX_ATTEMPTS", defaults.max_attempts),
            initial_backoff: Duration::from_millis(env_or("CLEANUP_INITIAL_BACKOFF_MS", 200)),
            max_backoff: Duration::from_millis(env_or("CLEANUP_MAX_BACKOFF_MS", 10_000)),
            reconcile_interval: Duration::from_secs(env_or("RECONCILE_INTERVAL_SECS", 300)),
            pending_grace: Duration::from_secs(env_or("RECONCILE_PENDING_GRACE_SECS", 900)),
            batch_size: env_or("RECONCILE_BATCH_SIZE", defaults.batch_size),
        };

        assert!(config.queue_capacity > 0, "CLEANUP_QUEUE_CAPACITY must be positive");
        assert!(config.max_attempts > 0, "CLEANUP_MAX_ATTEMPTS must be positive");
        assert!(config.batch_size > 0, "RECONCILE_BATCH_SIZE must be positive");
        assert!(
            !config.reconcile_interval.is_zero(),
            "RECONCILE_INTERVAL_SECS must be positive"
        );
        config
    }
}

/// Read `name`, falling back to `default` when unset.
///
/// Panics on a malformed value so misconfiguration fails at startup.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
