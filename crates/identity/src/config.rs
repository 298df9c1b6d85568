use std::time::Duration;

/// Default per-request timeout for identity lookups.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Identity service settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the user service, e.g. `http://users:8080`.
    pub base_url: String,
    pub timeout: Duration,
}

impl IdentityConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default    |
    /// |-------------------------|------------|
    /// | `IDENTITY_SERVICE_URL`  | (required) |
    /// | `IDENTITY_TIMEOUT_SECS` | `5`        |
    ///
    /// # Panics
    ///
    /// Panics if `IDENTITY_SERVICE_URL` is unset or the timeout is malformed.
    pub fn from_env() -> Self {
        let base_url = std::env::var("IDENTITY_SERVICE_URL").expect("IDENTITY_SERVICE_URL must be set");

        let timeout_secs: u64 = std::env::var("IDENTITY_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("IDENTITY_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
