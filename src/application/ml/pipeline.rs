//! The fitted artifact: feature encoder + random forest, persisted as JSON.

use super::encoder::FeatureEncoder;
use crate::domain::errors::{PipelineError, PredictionError};
use crate::domain::features::FeatureRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub type Regressor = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Bumped whenever the artifact layout changes incompatibly
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Held-out scores, in MAD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub format_version: u32,
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
    pub n_features: usize,
    pub n_train_samples: usize,
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub metadata: PipelineMetadata,
    encoder: FeatureEncoder,
    model: Regressor,
}

impl fmt::Debug for TrainedPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedPipeline")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl TrainedPipeline {
    pub fn new(encoder: FeatureEncoder, model: Regressor, n_train_samples: usize) -> Self {
        Self {
            metadata: PipelineMetadata {
                format_version: ARTIFACT_FORMAT_VERSION,
                model_type: "random_forest_regressor".to_string(),
                trained_at: Utc::now(),
                n_features: encoder.width(),
                n_train_samples,
                evaluation: None,
            },
            encoder,
            model,
        }
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<f64, PredictionError> {
        let predictions = self.predict_batch(std::slice::from_ref(record))?;
        predictions.first().copied().ok_or_else(|| PredictionError::Model {
            reason: "No prediction returned".to_string(),
        })
    }

    pub fn predict_batch(&self, records: &[FeatureRecord]) -> Result<Vec<f64>, PredictionError> {
        let rows = self.encoder.transform_batch(records)?;
        if let Some(row) = rows.first() {
            if row.len() != self.metadata.n_features {
                return Err(PredictionError::Encoding {
                    reason: format!(
                        "encoded {} features, model expects {}",
                        row.len(),
                        self.metadata.n_features
                    ),
                });
            }
        }

        let matrix = DenseMatrix::from_2d_vec(&rows).map_err(|e| PredictionError::Encoding {
            reason: format!("Matrix creation failed: {}", e),
        })?;

        self.model.predict(&matrix).map_err(|e| PredictionError::Model {
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let io_err = |source: std::io::Error| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        writer.flush().map_err(io_err)?;

        info!("Saved trained pipeline to {:?}", path);
        Ok(())
    }

    /// Reads an artifact written by [`TrainedPipeline::save`] and checks that
    /// the encoder and the recorded feature count agree.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let pipeline: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        if pipeline.metadata.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::Inconsistent(format!(
                "format version {} (expected {})",
                pipeline.metadata.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if pipeline.encoder.width() != pipeline.metadata.n_features {
            return Err(PipelineError::Inconsistent(format!(
                "encoder produces {} features, metadata records {}",
                pipeline.encoder.width(),
                pipeline.metadata.n_features
            )));
        }

        info!(
            "Loaded trained pipeline from {:?} (trained {}, {} features)",
            path, pipeline.metadata.trained_at, pipeline.metadata.n_features
        );
        Ok(pipeline)
    }
}
