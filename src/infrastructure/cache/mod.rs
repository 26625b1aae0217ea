//! Best-effort memoization of predictions.
//!
//! ```text
//! ResultCache
//!   ├── Some(RedisBackend)     <- shared across replicas
//!   ├── Some(InMemoryBackend)  <- single process, tests
//!   └── None                   <- disabled: every lookup misses, every write is dropped
//! ```
//!
//! Every backend failure (connection, timeout, corrupt payload) is logged and
//! turned into a miss or a dropped write. Nothing here can fail a request.

mod memory;
mod redis_backend;

pub use memory::InMemoryBackend;
pub use redis_backend::RedisBackend;

use crate::config::CacheMode;
use crate::domain::errors::CacheError;
use crate::domain::features::CacheKey;
use crate::domain::ports::CacheBackend;
use crate::domain::prediction::PredictionResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Lifetime of a cached prediction
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Outcome of a cache read, before failures are folded into misses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    Hit(PredictionResult),
    Miss,
    Failed,
}

impl CacheLookup {
    pub fn outcome(&self) -> &'static str {
        match self {
            CacheLookup::Hit(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Failed => "error",
        }
    }

    pub fn into_option(self) -> Option<PredictionResult> {
        match self {
            CacheLookup::Hit(result) => Some(result),
            CacheLookup::Miss | CacheLookup::Failed => None,
        }
    }
}

#[derive(Clone)]
pub struct ResultCache {
    backend: Option<Arc<dyn CacheBackend>>,
    timeout: Duration,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout,
            ttl: CACHE_TTL,
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            backend: None,
            timeout: Duration::ZERO,
            ttl: CACHE_TTL,
        }
    }

    /// Builds the cache selected by configuration.
    ///
    /// An unreachable Redis yields a disabled cache, never an error.
    pub async fn connect(mode: &CacheMode, timeout: Duration) -> Self {
        match mode {
            CacheMode::Disabled => {
                info!("Result cache disabled");
                Self::disabled()
            }
            CacheMode::Memory => {
                info!("Using in-process result cache");
                Self::new(Arc::new(InMemoryBackend::new()), timeout)
            }
            CacheMode::Redis(url) => {
                match bounded(timeout, RedisBackend::connect(url)).await {
                    Ok(backend) => Self::new(Arc::new(backend), timeout),
                    Err(e) => {
                        warn!("Redis unavailable ({}). Continuing without result cache.", e);
                        Self::disabled()
                    }
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.as_ref().map_or("disabled", |b| b.name())
    }

    pub async fn lookup(&self, key: &CacheKey) -> CacheLookup {
        let Some(backend) = &self.backend else {
            return CacheLookup::Miss;
        };

        let payload = match bounded(self.timeout, backend.get(key.as_str())).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(backend = backend.name(), "Cache read failed: {}", e);
                return CacheLookup::Failed;
            }
        };

        match serde_json::from_str::<PredictionResult>(&payload) {
            Ok(result) => CacheLookup::Hit(result),
            Err(e) => {
                let e = CacheError::CorruptPayload(e.to_string());
                warn!(backend = backend.name(), "Ignoring cache entry: {}", e);
                CacheLookup::Failed
            }
        }
    }

    /// Cached result for `key`, or `None` on miss or any failure
    pub async fn get(&self, key: &CacheKey) -> Option<PredictionResult> {
        self.lookup(key).await.into_option()
    }

    /// Stores `value` for the fixed TTL. Failures are logged and dropped.
    pub async fn set(&self, key: &CacheKey, value: &PredictionResult) {
        let Some(backend) = &self.backend else {
            return;
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode prediction for cache: {}", e);
                return;
            }
        };

        if let Err(e) = bounded(self.timeout, backend.set(key.as_str(), payload, self.ttl)).await {
            warn!(backend = backend.name(), "Cache write failed: {}", e);
        }
    }
}

/// Runs a cache operation with an upper bound on its duration.
async fn bounded<T, F>(timeout: Duration, op: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
