//! Startup wiring: load the model once, connect the cache, build the service.

use crate::application::ml::{SmartCorePredictor, TrainedPipeline};
use crate::application::prediction_service::PredictionService;
use crate::config::Config;
use crate::domain::errors::PipelineError;
use crate::domain::ports::PricePredictor;
use crate::infrastructure::cache::ResultCache;
use crate::infrastructure::observability::Metrics;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reads the artifact and wraps it as a predictor.
pub fn load_predictor(path: &Path) -> Result<SmartCorePredictor, PipelineError> {
    TrainedPipeline::load(path).map(SmartCorePredictor::new)
}

async fn load_predictor_blocking(path: PathBuf) -> Result<SmartCorePredictor, PipelineError> {
    let display = path.clone();
    tokio::task::spawn_blocking(move || load_predictor(&path))
        .await
        .map_err(|e| PipelineError::Io {
            path: display,
            source: std::io::Error::other(e.to_string()),
        })?
}

/// Builds the service context for the server.
///
/// With `require_model`, a missing or unreadable artifact is a startup error.
/// Without it, the server starts not-ready and answers 503.
pub async fn build_service(config: &Config) -> Result<PredictionService> {
    let metrics = Metrics::new().context("Failed to create metrics registry")?;
    let cache = ResultCache::connect(&config.cache_mode, config.cache_timeout).await;
    info!("Result cache backend: {}", cache.backend_name());

    match load_predictor_blocking(config.model_path.clone()).await {
        Ok(predictor) => {
            info!(
                "Model loaded successfully from {:?} ({} {})",
                config.model_path,
                predictor.name(),
                predictor.version()
            );
            Ok(PredictionService::new(Arc::new(predictor), cache, metrics))
        }
        Err(e) if config.require_model => {
            error!("Failed to load model: {}", e);
            Err(e).with_context(|| {
                format!("Cannot start without a model at {:?}", config.model_path)
            })
        }
        Err(e) => {
            warn!("Failed to load model: {}. Starting NOT READY; /predict will return 503.", e);
            Ok(PredictionService::without_model(cache, metrics))
        }
    }
}
