//! Configuration module.
//!
//! Settings come from environment variables (optionally via a `.env` file),
//! grouped by concern: the HTTP server and model artifact, and the result cache.

mod cache_config;
mod server_config;

pub use cache_config::{CacheEnvConfig, CacheMode, DEFAULT_REDIS_URL};
pub use server_config::{DEFAULT_MODEL_PATH, ServerEnvConfig};

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub model_path: PathBuf,
    pub require_model: bool,
    pub cache_mode: CacheMode,
    pub cache_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerEnvConfig::from_lookup(&lookup).context("Failed to load server config")?;
        let cache = CacheEnvConfig::from_lookup(&lookup).context("Failed to load cache config")?;

        Ok(Self {
            api_host: server.host,
            api_port: server.port,
            model_path: server.model_path,
            require_model: server.require_model,
            cache_mode: cache.mode,
            cache_timeout: cache.timeout,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(|_| None).expect("Should parse with defaults");
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.cache_mode, CacheMode::Redis(DEFAULT_REDIS_URL.to_string()));
        assert!(config.require_model);
    }

    #[test]
    fn test_config_from_map() {
        let vars: HashMap<&str, &str> = [
            ("API_PORT", "8080"),
            ("REDIS_URL", "memory"),
            ("CACHE_TIMEOUT_MS", "50"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
            .expect("Should parse overrides");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.cache_mode, CacheMode::Memory);
        assert_eq!(config.cache_timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_config_error_names_the_variable() {
        let err = Config::from_lookup(|k| (k == "API_PORT").then(|| "x".to_string()))
            .expect_err("Invalid port should fail");
        assert!(format!("{:#}", err).contains("API_PORT"));
    }
}
