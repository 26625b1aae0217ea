use super::pipeline::TrainedPipeline;
use crate::domain::errors::PredictionError;
use crate::domain::features::FeatureRecord;
use crate::domain::ports::PricePredictor;
use crate::domain::prediction::PredictionResult;
use std::sync::Arc;

/// [`PricePredictor`] backed by an in-process [`TrainedPipeline`].
pub struct SmartCorePredictor {
    pipeline: Arc<TrainedPipeline>,
    version: String,
}

impl SmartCorePredictor {
    pub fn new(pipeline: TrainedPipeline) -> Self {
        let version = format!(
            "v{} ({})",
            pipeline.metadata.format_version,
            pipeline.metadata.trained_at.format("%Y-%m-%dT%H:%M:%SZ")
        );
        Self {
            pipeline: Arc::new(pipeline),
            version,
        }
    }

    pub fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }
}

impl PricePredictor for SmartCorePredictor {
    fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        let price = self.pipeline.predict(record)?;
        if !price.is_finite() {
            return Err(PredictionError::NonFinite { value: price });
        }
        Ok(PredictionResult::new(price))
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }

    fn version(&self) -> &str {
        &self.version
    }
}
