use serde::{Deserialize, Serialize};

/// Estimated resale price, in Moroccan dirhams.
///
/// This is also the cache payload, so its JSON shape is a wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_price_mad: f64,
}

impl PredictionResult {
    pub fn new(predicted_price_mad: f64) -> Self {
        Self {
            predicted_price_mad,
        }
    }
}
