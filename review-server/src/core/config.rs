use crate::auth::JwtConfig;
use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// Every knob can be overridden via environment variable:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/review-engine | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | TXN_MAX_RETRIES | 10 | Retry budget for conflicting aggregate writes |
/// | REVIEW_LIST_MAX | 100 | Upper bound for review list page sizes |
///
/// JWT settings (`JWT_SECRET`, `JWT_EXPIRATION_MINUTES`, `JWT_ISSUER`,
/// `JWT_AUDIENCE`) are read by [`JwtConfig`].
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/review-engine HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Retry budget for conflicting transactional writes
    pub txn_max_retries: u32,
    /// Upper bound for review list page sizes
    pub review_list_max: i64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/review-engine".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            txn_max_retries: std::env::var("TXN_MAX_RETRIES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            review_list_max: std::env::var("REVIEW_LIST_MAX")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
        }
    }

    /// Override the work dir and port; used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Directory holding the SQLite database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Ensure the work directory structure exists
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_overrides("/tmp/review-test", 0);
        assert_eq!(config.work_dir, "/tmp/review-test");
        assert_eq!(config.txn_max_retries, 10);
        assert_eq!(config.review_list_max, 100);
        assert!(config.database_dir().ends_with("database"));
    }
}
