//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The provider secret key is loaded from the DUO_SKEY env var or from
//! secret_key_file, never stored in the TOML directly to avoid leaking
//! secrets. The integration key is a public identifier and lives in the TOML.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub duo: DuoConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Provider connection settings
#[derive(Debug, Deserialize)]
pub struct DuoConfig {
    /// API host, with or without an explicit scheme
    pub api_host: String,
    /// Public integration identifier
    pub integration_key: String,
    #[serde(skip)]
    pub secret_key: Option<Secret<String>>,
    /// Path to a file containing the secret key (alternative to DUO_SKEY)
    #[serde(default)]
    pub secret_key_file: Option<PathBuf>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Account status cache settings
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_max_connections() -> usize {
    1000
}

fn default_cache_capacity() -> u64 {
    duo_resolve::DEFAULT_CACHE_CAPACITY
}

fn default_cache_ttl_secs() -> u64 {
    duo_resolve::DEFAULT_CACHE_TTL.as_secs()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Secret key resolution order:
    /// 1. DUO_SKEY env var
    /// 2. secret_key_file path from config
    ///
    /// A missing secret key is a configuration error; the gateway cannot
    /// sign pre-authentication requests without it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.duo.api_host.trim().is_empty() {
            return Err(common::Error::Config("api_host must not be empty".into()));
        }

        if config.duo.integration_key.trim().is_empty() {
            return Err(common::Error::Config(
                "integration_key must not be empty".into(),
            ));
        }

        if config.duo.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.cache.capacity == 0 {
            return Err(common::Error::Config(
                "cache capacity must be greater than 0".into(),
            ));
        }

        if config.cache.ttl_secs == 0 {
            return Err(common::Error::Config(
                "cache ttl_secs must be greater than 0".into(),
            ));
        }

        // Resolve secret key: env var takes precedence over file
        if let Ok(key) = std::env::var("DUO_SKEY") {
            config.duo.secret_key = Some(Secret::new(key));
        } else if let Some(ref key_file) = config.duo.secret_key_file {
            let key = std::fs::read_to_string(key_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read secret_key_file {}: {e}",
                    key_file.display()
                ))
            })?;
            let key = key.trim().to_owned();
            if !key.is_empty() {
                config.duo.secret_key = Some(Secret::new(key));
            }
        }

        if config.duo.secret_key.is_none() {
            return Err(common::Error::Config(
                "secret key not configured: set DUO_SKEY or secret_key_file".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("preauth-gateway.toml")
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.duo.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
