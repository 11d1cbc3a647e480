use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Production output goes to log collectors, so ANSI colouring is off.
    #[must_use]
    pub fn ansi_logs(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only commands that touch Postgres need it; see [`AppConfig::require_database_url`].
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub products_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Total fetch attempts per page, including the first.
    pub scraper_max_attempts: u32,
    /// Base delay for exponential backoff: `base * 2^attempt`.
    pub scraper_backoff_base_ms: u64,
    pub scraper_jitter_min_ms: u64,
    pub scraper_jitter_max_ms: u64,
    pub scraper_max_concurrent: usize,
    pub scrape_interval_hours: u64,
    /// When set, each decoded embedded-JSON document is written here.
    pub debug_json_path: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the database URL, or an error naming the missing variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("products_path", &self.products_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_attempts", &self.scraper_max_attempts)
            .field("scraper_backoff_base_ms", &self.scraper_backoff_base_ms)
            .field("scraper_jitter_min_ms", &self.scraper_jitter_min_ms)
            .field("scraper_jitter_max_ms", &self.scraper_jitter_max_ms)
            .field("scraper_max_concurrent", &self.scraper_max_concurrent)
            .field("scrape_interval_hours", &self.scrape_interval_hours)
            .field("debug_json_path", &self.debug_json_path)
            .finish()
    }
}
