//! Price model: feature encoding, training, persistence and in-process inference.

pub mod dataset;
pub mod encoder;
pub mod pipeline;
pub mod predictor;
pub mod training;

pub use encoder::FeatureEncoder;
pub use pipeline::{EvaluationReport, TrainedPipeline};
pub use predictor::SmartCorePredictor;
pub use training::{TrainingJob, TrainingParams};
