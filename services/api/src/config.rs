//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// TLS requirement for the PostgreSQL connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatabaseSsl {
    Disable,
    Prefer,
    Require,
}

impl std::str::FromStr for DatabaseSsl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" | "false" | "0" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" | "true" | "1" => Ok(Self::Require),
            other => Err(format!("'{}' is not one of disable, prefer, require", other)),
        }
    }
}

/// Which storage backend the server runs against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres {
        database_url: String,
        ssl: DatabaseSsl,
        max_connections: u32,
    },
    File {
        path: PathBuf,
    },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage: StorageConfig,
    pub static_root: PathBuf,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let static_root = lookup("STATIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./public"));

        let cors_origin = lookup("CORS_ORIGIN").filter(|origin| !origin.trim().is_empty());

        // --- Load Storage Settings ---
        // A database URL selects PostgreSQL, otherwise the flat file is used.
        let storage = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(database_url) => {
                let ssl = match lookup("DATABASE_SSL") {
                    Some(raw) => raw.parse::<DatabaseSsl>().map_err(|e| {
                        ConfigError::InvalidValue("DATABASE_SSL".to_string(), e)
                    })?,
                    None => DatabaseSsl::Prefer,
                };
                let max_connections = match lookup("DB_MAX_CONNECTIONS") {
                    Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                        ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string(), e.to_string())
                    })?,
                    None => 5,
                };
                StorageConfig::Postgres {
                    database_url,
                    ssl,
                    max_connections,
                }
            }
            None => StorageConfig::File {
                path: lookup("DATA_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/db.json")),
            },
        };

        Ok(Self {
            bind_address,
            log_level,
            storage,
            static_root,
            cors_origin,
        })
    }
}
