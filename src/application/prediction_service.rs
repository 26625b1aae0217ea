//! Request pipeline for a single price estimate.
//!
//! readiness -> validate -> normalize -> cache lookup -> predict -> cache store -> count
//!
//! The service owns no per-request state. It is built once at startup and
//! shared by every request handler.

use crate::domain::errors::{PredictionError, ServiceError};
use crate::domain::features::FeatureRecord;
use crate::domain::ports::PricePredictor;
use crate::domain::prediction::PredictionResult;
use crate::infrastructure::cache::{CacheLookup, ResultCache};
use crate::infrastructure::observability::{LatencyGuard, Metrics};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub struct PredictionService {
    predictor: Option<Arc<dyn PricePredictor>>,
    cache: ResultCache,
    metrics: Metrics,
}

impl PredictionService {
    pub fn new(predictor: Arc<dyn PricePredictor>, cache: ResultCache, metrics: Metrics) -> Self {
        Self {
            predictor: Some(predictor),
            cache,
            metrics,
        }
    }

    /// A service without a model. Every prediction fails with
    /// [`ServiceError::Unavailable`] before touching cache or input.
    pub fn without_model(cache: ResultCache, metrics: Metrics) -> Self {
        Self {
            predictor: None,
            cache,
            metrics,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }

    /// Name and version of the loaded model
    pub fn model_info(&self) -> Option<(&str, &str)> {
        self.predictor.as_deref().map(|p| (p.name(), p.version()))
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Entry point for an already-parsed JSON payload.
    pub async fn handle_predict(&self, raw: &Value) -> Result<PredictionResult, ServiceError> {
        let _timer = LatencyGuard::start(&self.metrics.request_processing_seconds);
        let predictor = self.ready_predictor()?;
        let record = FeatureRecord::validate(raw)?;
        self.serve(predictor, record).await
    }

    /// Entry point for a raw request body. Readiness is checked before the
    /// body is even parsed, so a missing model always wins over bad input.
    pub async fn handle_predict_body(&self, body: &[u8]) -> Result<PredictionResult, ServiceError> {
        let _timer = LatencyGuard::start(&self.metrics.request_processing_seconds);
        let predictor = self.ready_predictor()?;
        let record = FeatureRecord::from_json_slice(body)?;
        self.serve(predictor, record).await
    }

    fn ready_predictor(&self) -> Result<Arc<dyn PricePredictor>, ServiceError> {
        self.predictor.clone().ok_or(ServiceError::Unavailable)
    }

    async fn serve(
        &self,
        predictor: Arc<dyn PricePredictor>,
        record: FeatureRecord,
    ) -> Result<PredictionResult, ServiceError> {
        let record = record.normalize();
        let key = record.cache_key();

        let lookup = self.cache.lookup(&key).await;
        self.metrics.inc_cache_lookup(lookup.outcome());
        if let CacheLookup::Hit(result) = lookup {
            debug!("Cache hit for {}", key);
            self.metrics.inc_predictions();
            return Ok(result);
        }

        let result = predict_blocking(predictor, record).await.map_err(|e| {
            error!("Prediction failed: {}", e);
            ServiceError::Prediction(e)
        })?;

        self.cache.set(&key, &result).await;
        self.metrics.inc_predictions();
        Ok(result)
    }
}

/// Runs the CPU-bound model call off the async workers.
async fn predict_blocking(
    predictor: Arc<dyn PricePredictor>,
    record: FeatureRecord,
) -> Result<PredictionResult, PredictionError> {
    tokio::task::spawn_blocking(move || predictor.predict(&record))
        .await
        .map_err(|e| PredictionError::Worker {
            reason: e.to_string(),
        })?
}
