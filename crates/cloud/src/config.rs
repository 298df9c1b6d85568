//! Object store configuration loaded from the environment.

use std::time::Duration;

/// Default lifetime of minted access URLs.
pub const DEFAULT_URL_EXPIRY_SECS: u64 = 3600;

const DEFAULT_BUCKET: &str = "quill-articles";
const DEFAULT_REGION: &str = "us-east-1";

/// Which [`crate::ObjectStore`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" | "minio" => Some(Self::S3),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Connection settings for S3 or an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Custom endpoint (e.g. `http://localhost:9000` for MinIO).
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    /// Static credentials; when absent the default AWS provider chain is used.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Path-style addressing, required by most S3-compatible servers.
    pub force_path_style: bool,
}

/// Object store settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3: S3Config,
    /// Lifetime of minted access URLs. Never caller-supplied.
    pub url_expiry: Duration,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default              |
    /// |--------------------------|----------------------|
    /// | `OBJECT_STORE_BACKEND`   | `s3`                 |
    /// | `S3_ENDPOINT`            | --                   |
    /// | `S3_BUCKET`              | `quill-articles`     |
    /// | `S3_REGION`              | `us-east-1`          |
    /// | `S3_ACCESS_KEY`          | --                   |
    /// | `S3_SECRET_KEY`          | --                   |
    /// | `S3_FORCE_PATH_STYLE`    | `true` iff endpoint  |
    /// | `OBJECT_URL_EXPIRY_SECS` | `3600`               |
    ///
    /// # Panics
    ///
    /// Panics on an unknown backend or a malformed number/boolean.
    pub fn from_env() -> Self {
        let backend_raw = std::env::var("OBJECT_STORE_BACKEND").unwrap_or_else(|_| "s3".into());
        let backend = StorageBackend::parse(&backend_raw)
            .unwrap_or_else(|| panic!("OBJECT_STORE_BACKEND must be 's3' or 'memory', got '{backend_raw}'"));

        let endpoint = non_empty_var("S3_ENDPOINT");
        let force_path_style = match std::env::var("S3_FORCE_PATH_STYLE") {
            Ok(v) => v
                .parse()
                .expect("S3_FORCE_PATH_STYLE must be 'true' or 'false'"),
            Err(_) => endpoint.is_some(),
        };

        let url_expiry_secs: u64 = std::env::var("OBJECT_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| DEFAULT_URL_EXPIRY_SECS.to_string())
            .parse()
            .expect("OBJECT_URL_EXPIRY_SECS must be a valid u64");
        assert!(url_expiry_secs > 0, "OBJECT_URL_EXPIRY_SECS must be positive");

        Self {
            backend,
            s3: S3Config {
                endpoint,
                bucket: non_empty_var("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.into()),
                region: non_empty_var("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
                access_key: non_empty_var("S3_ACCESS_KEY"),
                secret_key: non_empty_var("S3_SECRET_KEY"),
                force_path_style,
            },
            url_expiry: Duration::from_secs(url_expiry_secs),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
