//! Offline fitting of the price pipeline from historical listings.

use super::dataset::{self, LabeledRecord, PreprocessOptions};
use super::encoder::FeatureEncoder;
use super::pipeline::{EvaluationReport, Regressor, TrainedPipeline};
use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureRecord;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::path::PathBuf;
use tracing::info;

/// Random forest hyper-parameters
#[derive(Debug, Clone)]
pub struct TrainingParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// Everything a training run needs, end to end
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: TrainingParams,
    pub preprocess: PreprocessOptions,
    /// Fraction of rows held out for evaluation; 0 trains on everything
    pub test_fraction: f64,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub n_train: usize,
    pub evaluation: Option<EvaluationReport>,
    pub output: PathBuf,
}

pub fn fit_pipeline(
    train: &[LabeledRecord],
    params: &TrainingParams,
) -> Result<TrainedPipeline, PipelineError> {
    if train.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    if params.n_estimators == 0 {
        return Err(PipelineError::InvalidParameter(
            "n_estimators must be at least 1".to_string(),
        ));
    }

    let records: Vec<FeatureRecord> = train
        .iter()
        .map(|r| r.features.clone())
        .collect();
    let targets: Vec<f64> = train.iter().map(|r| r.price_mad).collect();

    let encoder = FeatureEncoder::fit(&records)?;
    let rows = encoder
        .transform_batch(&records)
        .map_err(|e| PipelineError::Training(e.to_string()))?;
    let x = DenseMatrix::from_2d_vec(&rows)
        .map_err(|e| PipelineError::Training(format!("Matrix error: {}", e)))?;

    let mut rf_params = RandomForestRegressorParameters::default()
        .with_n_trees(params.n_estimators)
        .with_min_samples_split(params.min_samples_split);
    rf_params.seed = params.seed;
    if let Some(depth) = params.max_depth {
        rf_params = rf_params.with_max_depth(depth);
    }

    info!(
        "Training Random Forest Regressor (trees: {}, depth: {:?}, min split: {}) \
         on {} samples x {} features",
        params.n_estimators,
        params.max_depth,
        params.min_samples_split,
        rows.len(),
        encoder.width()
    );

    let model: Regressor = Regressor::fit(&x, &targets, rf_params)
        .map_err(|e| PipelineError::Training(e.to_string()))?;

    Ok(TrainedPipeline::new(encoder, model, train.len()))
}

/// RMSE, MAE and R² of the pipeline on held-out rows
pub fn evaluate(
    pipeline: &TrainedPipeline,
    test: &[LabeledRecord],
) -> Result<EvaluationReport, PipelineError> {
    if test.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let records: Vec<FeatureRecord> = test
        .iter()
        .map(|r| r.features.clone())
        .collect();
    let predictions = pipeline
        .predict_batch(&records)
        .map_err(|e| PipelineError::Training(e.to_string()))?;
    let actuals: Vec<f64> = test.iter().map(|r| r.price_mad).collect();

    Ok(score(&predictions, &actuals))
}

fn score(predictions: &[f64], actuals: &[f64]) -> EvaluationReport {
    let n = predictions.len() as f64;
    let sq_err: f64 = predictions
        .iter()
        .zip(actuals)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    let abs_err: f64 = predictions
        .iter()
        .zip(actuals)
        .map(|(p, t)| (p - t).abs())
        .sum();

    let mean_y = actuals.iter().sum::<f64>() / n;
    let ss_tot: f64 = actuals.iter().map(|t| (t - mean_y).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - sq_err / ss_tot } else { 0.0 };

    EvaluationReport {
        rmse: (sq_err / n).sqrt(),
        mae: abs_err / n,
        r2,
        n_samples: predictions.len(),
    }
}

/// Load, clean, split, fit, evaluate and persist.
pub fn run(job: &TrainingJob) -> Result<TrainingOutcome, PipelineError> {
    let rows = dataset::load_csv(&job.input, job.preprocess)?;

    let (train, test) = if job.test_fraction > 0.0 {
        dataset::train_test_split(rows, job.test_fraction, job.params.seed)?
    } else {
        (rows, Vec::new())
    };

    let mut pipeline = fit_pipeline(&train, &job.params)?;

    let evaluation = if test.is_empty() {
        None
    } else {
        let report = evaluate(&pipeline, &test)?;
        info!(
            "Held-out (n={}): RMSE={:.2} MAD, MAE={:.2} MAD, R2={:.3}",
            report.n_samples, report.rmse, report.mae, report.r2
        );
        Some(report)
    };
    pipeline.metadata.evaluation = evaluation;

    pipeline.save(&job.output)?;

    Ok(TrainingOutcome {
        n_train: train.len(),
        evaluation,
        output: job.output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_on_perfect_predictions() {
        let report = score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(report.rmse, 0.0);
        assert_eq!(report.mae, 0.0);
        assert_eq!(report.r2, 1.0);
        assert_eq!(report.n_samples, 3);
    }

    #[test]
    fn test_score_matches_hand_computation() {
        // errors: 1, -1, 2 -> mse 2, mae 4/3; mean y 2, ss_tot 2
        let report = score(&[2.0, 1.0, 5.0], &[1.0, 2.0, 3.0]);
        assert!((report.rmse - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((report.mae - 4.0 / 3.0).abs() < 1e-12);
        assert!((report.r2 - (1.0 - 6.0 / 2.0)).abs() < 1e-12);
    }

    fn listing() -> LabeledRecord {
        LabeledRecord {
            features: FeatureRecord {
                company: "Maruti".to_string(),
                model: "Swift".to_string(),
                fuel: "Petrol".to_string(),
                seller_type: "Individual".to_string(),
                transmission: "Manual".to_string(),
                km_driven: 50000.0,
                mileage_mpg: 45.0,
                engine_cc: 1200.0,
                max_power_bhp: 80.0,
                seats: 5,
                age: Some(6),
            },
            price_mad: 45000.0,
        }
    }

    #[test]
    fn test_fit_rejects_empty_training_set() {
        let err = fit_pipeline(&[], &TrainingParams::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));
    }

    #[test]
    fn test_fit_rejects_zero_trees() {
        let params = TrainingParams {
            n_estimators: 0,
            ..Default::default()
        };
        let err = fit_pipeline(&[listing()], &params).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }
}
