use dotenv::dotenv;
use dotenv::from_path;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load .env file from path {path}: {reason}")]
    EnvFile { path: String, reason: String },

    #[error("Invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which users collection backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => f.write_str("sqlite"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub database_path: String,
    pub store_backend: StoreBackend,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from a specified `.env` file path or default to the root `.env` file.
    pub fn from_env(env_path: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(path) = env_path {
            from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        } else {
            // A missing root `.env` is fine
            dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. `API_PORT` wins over
    /// `PORT`, which the hosting platform may set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_var = match lookup("API_PORT") {
            Some(value) => Some(("API_PORT", value)),
            None => lookup("PORT").map(|value| ("PORT", value)),
        };
        let api_port: u16 = match port_var {
            Some((key, value)) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })?,
            None => 3000,
        };

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value
                .parse()
                .map_err(|value| ConfigError::InvalidValue { key: "STORE_BACKEND", value })?,
            None => StoreBackend::Sqlite,
        };

        Ok(Self {
            api_host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "users.db".to_string()),
            store_backend,
            log_filter: lookup("RUST_LOG")
                .unwrap_or_else(|| "api_server=debug,domain=info,tower_http=debug".to_string()),
        })
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
