use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
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
    /// `DATABASE_URL`. Read it through [`AppConfig::database_url`].
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub channels_path: PathBuf,
    /// Shared secret expected in the `X-API-Key` header on protected reads.
    pub api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Upper bound on a single store call; exceeded calls fail that record only.
    pub db_statement_timeout_secs: u64,
    pub extractor_bin: String,
    pub extractor_timeout_secs: u64,
    pub hub_url: String,
    pub hub_timeout_secs: u64,
    pub hub_secret: Option<String>,
    pub hub_lease_seconds: Option<u64>,
    pub backfill_limit: usize,
    pub max_concurrent_channels: usize,
    pub max_concurrent_fetches: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("channels_path", &self.channels_path)
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("db_statement_timeout_secs", &self.db_statement_timeout_secs)
            .field("extractor_bin", &self.extractor_bin)
            .field("extractor_timeout_secs", &self.extractor_timeout_secs)
            .field("hub_url", &self.hub_url)
            .field("hub_timeout_secs", &self.hub_timeout_secs)
            .field("hub_secret", &self.hub_secret.as_ref().map(|_| "[redacted]"))
            .field("hub_lease_seconds", &self.hub_lease_seconds)
            .field("backfill_limit", &self.backfill_limit)
            .field("max_concurrent_channels", &self.max_concurrent_channels)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .finish()
    }
}

impl AppConfig {
    /// The Postgres connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}
