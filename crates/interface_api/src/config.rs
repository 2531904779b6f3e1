//! API configuration

use std::time::Duration;

use domain_groups::RetryPolicy;
use infra_db::DatabaseConfig;
use serde::Deserialize;

/// Where groups are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    /// PostgreSQL at `database_url`
    Postgres,
}

/// API configuration
///
/// Every field can be set through a `GROUPS_API_` prefixed environment
/// variable, e.g. `GROUPS_API_PORT=9000` or `GROUPS_API_STORAGE=postgres`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL, used when `storage` is `postgres`
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// How long to wait for a pooled connection
    pub db_connect_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    pub db_max_lifetime_secs: u64,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Retries of a write that lost an optimistic-concurrency race
    pub max_retries: u32,
    /// Base backoff between retries, grows linearly
    pub retry_delay_ms: u64,
    /// Requests running longer than this are answered with 408
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/groups".to_string(),
            db_max_connections: DatabaseConfig::DEFAULT_MAX_CONNECTIONS,
            db_min_connections: DatabaseConfig::DEFAULT_MIN_CONNECTIONS,
            db_connect_timeout_secs: DatabaseConfig::DEFAULT_CONNECT_TIMEOUT.as_secs(),
            db_idle_timeout_secs: DatabaseConfig::DEFAULT_IDLE_TIMEOUT.as_secs(),
            db_max_lifetime_secs: DatabaseConfig::DEFAULT_MAX_LIFETIME.as_secs(),
            log_level: "info".to_string(),
            log_json: false,
            max_retries: 3,
            retry_delay_ms: 10,
            request_timeout_secs: 30,
            storage: StorageBackend::Memory,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `GROUPS_API_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("GROUPS_API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pool settings for the PostgreSQL backend
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.db_idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.db_max_lifetime_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.retry_policy(), RetryPolicy::new(3, Duration::from_millis(10)));
        assert_eq!(
            config.database_config(),
            DatabaseConfig::new("postgres://localhost/groups")
        );
    }

    #[test]
    fn test_pool_settings_reach_database_config() {
        let config: ApiConfig = config::Config::builder()
            .set_override("database_url", "postgres://db/ledger")
            .unwrap()
            .set_override("db_max_connections", 25)
            .unwrap()
            .set_override("db_min_connections", 4)
            .unwrap()
            .set_override("db_connect_timeout_secs", 2)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let db = config.database_config();
        assert_eq!(db.url, "postgres://db/ledger");
        assert_eq!(db.max_connections, 25);
        assert_eq!(db.min_connections, 4);
        assert_eq!(db.connect_timeout, Duration::from_secs(2));
        assert_eq!(db.idle_timeout, DatabaseConfig::DEFAULT_IDLE_TIMEOUT);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9000)
            .unwrap()
            .set_override("storage", "postgres")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
