use crate::domain::errors::{CacheError, PredictionError};
use crate::domain::features::FeatureRecord;
use crate::domain::prediction::PredictionResult;
use async_trait::async_trait;
use std::time::Duration;

/// A trained function from one vehicle to one price.
///
/// Implementations hold read-only state and are called concurrently.
pub trait PricePredictor: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError>;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}

/// Raw key/value store behind the result cache.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    fn name(&self) -> &str;
}
