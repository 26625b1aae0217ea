//! HTTP listener and model artifact configuration.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/rf_model.json";

/// Server environment configuration
#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// Refuse to start without a model instead of answering 503
    pub require_model: bool,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            require_model: true,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("API_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid API_PORT: {}", v))?,
            None => defaults.port,
        };

        let require_model = match lookup("REQUIRE_MODEL") {
            Some(v) => parse_bool(&v).with_context(|| format!("Invalid REQUIRE_MODEL: {}", v))?,
            None => defaults.require_model,
        };

        Ok(Self {
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            require_model,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerEnvConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(config.require_model);
    }

    #[test]
    fn test_server_config_overrides() {
        let config = ServerEnvConfig::from_lookup(|k| match k {
            "API_HOST" => Some("127.0.0.1".to_string()),
            "API_PORT" => Some("9000".to_string()),
            "MODEL_PATH" => Some("/srv/model.json".to_string()),
            "REQUIRE_MODEL" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert!(!config.require_model);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result =
            ServerEnvConfig::from_lookup(|k| (k == "API_PORT").then(|| "eighty".to_string()));
        assert!(result.is_err());
    }
}
