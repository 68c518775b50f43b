//! Ledger configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default      |
//! |----------------------------|--------------|
//! | `NILE_DATABASE_PATH`       | `./nile.db`  |
//! | `NILE_DB_MAX_CONNECTIONS`  | `5`          |
//! | `NILE_DB_BUSY_TIMEOUT_MS`  | `5000`       |
//! | `NILE_LOG_LEVEL`           | `info`       |

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::pool::DbConfig;

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits for the SQLite write lock
    pub busy_timeout_ms: u64,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            database_path: "./nile.db".to_string(),
            max_connections: 5,
            busy_timeout_ms: 5000,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LedgerConfig::default();

        let config = LedgerConfig {
            database_path: lookup("NILE_DATABASE_PATH").unwrap_or(defaults.database_path),

            max_connections: match lookup("NILE_DB_MAX_CONNECTIONS") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("NILE_DB_MAX_CONNECTIONS".to_string()))?,
                None => defaults.max_connections,
            },

            busy_timeout_ms: match lookup("NILE_DB_BUSY_TIMEOUT_MS") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("NILE_DB_BUSY_TIMEOUT_MS".to_string()))?,
                None => defaults.busy_timeout_ms,
            },

            log_level: lookup("NILE_LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::OutOfRange {
                name: "NILE_DB_MAX_CONNECTIONS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("NILE_DATABASE_PATH".to_string()));
        }

        Ok(config)
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("{name} out of range: {reason}")]
    OutOfRange { name: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
