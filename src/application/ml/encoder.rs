//! Column transform between a [`FeatureRecord`] and the regressor's input row.
//!
//! Layout of an encoded row:
//! `[scaled numeric features (NUMERIC_FEATURES order)] ++ [one-hot block per categorical feature]`.
//! Categories unseen at fit time encode as an all-zero block.

use crate::domain::errors::{PipelineError, PredictionError};
use crate::domain::features::{CATEGORICAL_FEATURES, FeatureRecord, NUMERIC_FEATURES};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeSet;

/// Standardization parameters for one numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub mean: f64,
    pub scale: f64,
}

impl ColumnScaler {
    fn fit(values: &[f64]) -> Self {
        let mean = values.mean();
        let std = values.population_std_dev();
        // Constant columns keep their offset but are not rescaled
        let scale = if std.is_finite() && std > 0.0 { std } else { 1.0 };
        Self { mean, scale }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    scalers: Vec<ColumnScaler>,
    /// Sorted category vocabulary per categorical column
    vocabularies: Vec<Vec<String>>,
}

impl FeatureEncoder {
    pub fn fit(records: &[FeatureRecord]) -> Result<Self, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let scalers = (0..NUMERIC_FEATURES.len())
            .map(|col| {
                let column: Vec<f64> = records
                    .iter()
                    .map(|r| r.numeric_values()[col])
                    .collect();
                ColumnScaler::fit(&column)
            })
            .collect();

        let vocabularies = (0..CATEGORICAL_FEATURES.len())
            .map(|col| {
                records
                    .iter()
                    .map(|r| r.categorical_values()[col].to_string())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .collect();

        Ok(Self {
            scalers,
            vocabularies,
        })
    }

    /// Length of an encoded row
    pub fn width(&self) -> usize {
        self.scalers.len() + self.vocabularies.iter().map(Vec::len).sum::<usize>()
    }

    /// Fails only when the encoder itself does not match the record schema,
    /// which happens with a hand-edited or foreign artifact.
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, PredictionError> {
        if self.scalers.len() != NUMERIC_FEATURES.len()
            || self.vocabularies.len() != CATEGORICAL_FEATURES.len()
        {
            return Err(PredictionError::Encoding {
                reason: format!(
                    "encoder expects {} numeric and {} categorical columns, record has {} and {}",
                    self.scalers.len(),
                    self.vocabularies.len(),
                    NUMERIC_FEATURES.len(),
                    CATEGORICAL_FEATURES.len()
                ),
            });
        }

        let mut row = Vec::with_capacity(self.width());
        row.extend(
            self.scalers
                .iter()
                .zip(record.numeric_values())
                .map(|(scaler, value)| scaler.apply(value)),
        );

        for (vocab, value) in self.vocabularies.iter().zip(record.categorical_values()) {
            let hot = vocab.binary_search_by(|c| c.as_str().cmp(value)).ok();
            row.extend((0..vocab.len()).map(|i| if Some(i) == hot { 1.0 } else { 0.0 }));
        }

        Ok(row)
    }

    pub fn transform_batch(
        &self,
        records: &[FeatureRecord],
    ) -> Result<Vec<Vec<f64>>, PredictionError> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}
