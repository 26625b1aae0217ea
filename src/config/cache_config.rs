//! Result cache configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Which backing store serves the result cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    Disabled,
    Memory,
    Redis(String),
}

impl CacheMode {
    /// `none`, `off`, `disabled` or an empty string disable the cache,
    /// `memory` selects the in-process store, anything else is a Redis URL.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "none" | "off" | "disabled" => CacheMode::Disabled,
            "memory" => CacheMode::Memory,
            _ => CacheMode::Redis(trimmed.to_string()),
        }
    }
}

/// Cache environment configuration
#[derive(Debug, Clone)]
pub struct CacheEnvConfig {
    pub mode: CacheMode,
    pub timeout: Duration,
}

impl Default for CacheEnvConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Redis(DEFAULT_REDIS_URL.to_string()),
            timeout: Duration::from_millis(250),
        }
    }
}

impl CacheEnvConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup("REDIS_URL")
            .map(|v| CacheMode::parse(&v))
            .unwrap_or_else(|| CacheMode::Redis(DEFAULT_REDIS_URL.to_string()));

        let timeout_ms = match lookup("CACHE_TIMEOUT_MS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid CACHE_TIMEOUT_MS: {}", v))?,
            None => 250,
        };

        Ok(Self {
            mode,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}
