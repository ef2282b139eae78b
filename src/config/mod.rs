//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `VERSE_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `VERSE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Postgres host. Default: `localhost`.
    pub db_host: String,

    /// Postgres port. Default: `5432`.
    pub db_port: u16,

    /// Postgres user. Default: `postgres`.
    pub db_user: String,

    /// Postgres password. Default: empty.
    pub db_password: String,

    /// Postgres database name. Default: `verses`.
    pub db_name: String,

    /// Max connections held by the store pool. Default: `8`.
    pub db_pool_size: u32,

    /// Directory holding the embedding model
    /// (`config.json`, `tokenizer.json`, `model.safetensors`).
    pub model_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_user: "postgres".to_string(),
            db_password: String::new(),
            db_name: "verses".to_string(),
            db_pool_size: 8,
            model_path: None,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "VERSE_PORT";
    const ENV_BIND_ADDR: &'static str = "VERSE_BIND_ADDR";
    const ENV_DB_HOST: &'static str = "VERSE_DB_HOST";
    const ENV_DB_PORT: &'static str = "VERSE_DB_PORT";
    const ENV_DB_USER: &'static str = "VERSE_DB_USER";
    const ENV_DB_PASSWORD: &'static str = "VERSE_DB_PASSWORD";
    const ENV_DB_NAME: &'static str = "VERSE_DB_NAME";
    const ENV_DB_POOL_SIZE: &'static str = "VERSE_DB_POOL_SIZE";
    const ENV_MODEL_PATH: &'static str = "VERSE_MODEL_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(Self::ENV_PORT, defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let db_host = Self::parse_string_from_env(Self::ENV_DB_HOST, defaults.db_host);
        let db_port = Self::parse_port_from_env(Self::ENV_DB_PORT, defaults.db_port)?;
        let db_user = Self::parse_string_from_env(Self::ENV_DB_USER, defaults.db_user);
        let db_password = Self::parse_string_from_env(Self::ENV_DB_PASSWORD, defaults.db_password);
        let db_name = Self::parse_string_from_env(Self::ENV_DB_NAME, defaults.db_name);
        let db_pool_size = Self::parse_pool_size_from_env(defaults.db_pool_size)?;
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);

        Ok(Self {
            port,
            bind_addr,
            db_host,
            db_port,
            db_user,
            db_password,
            db_name,
            db_pool_size,
            model_path,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Returns the assembled Postgres connection URL.
    pub fn database_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }

    fn parse_port_from_env(var_name: &'static str, default: u16) -> Result<u16, ConfigError> {
        match env::var(var_name) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_pool_size_from_env(default: u32) -> Result<u32, ConfigError> {
        match env::var(Self::ENV_DB_POOL_SIZE) {
            Ok(value) => match value.parse::<u32>() {
                Ok(size) if size > 0 => Ok(size),
                _ => Err(ConfigError::InvalidPoolSize { value }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
