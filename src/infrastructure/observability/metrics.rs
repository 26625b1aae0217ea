//! Prometheus metrics for the prediction service
//!
//! Metric names match the existing dashboards,
//! so they carry no crate prefix.

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Process-wide request metrics
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Time spent in `handle_predict`, whatever the outcome
    pub request_processing_seconds: Histogram,
    /// Predictions served, from cache or model
    pub predictions_total: Counter,
    /// Cache lookups by outcome (hit, miss, error)
    pub cache_lookups_total: CounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with all collectors registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let request_processing_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_processing_seconds",
                "Time spent processing request",
            )
            .buckets(vec![
                0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )?;
        registry.register(Box::new(request_processing_seconds.clone()))?;

        let predictions_total = Counter::with_opts(Opts::new(
            "predictions_total",
            "Total number of predictions",
        ))?;
        registry.register(Box::new(predictions_total.clone()))?;

        let cache_lookups_total = CounterVec::new(
            Opts::new("cache_lookups_total", "Result cache lookups by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cache_lookups_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            request_processing_seconds,
            predictions_total,
            cache_lookups_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_predictions(&self) {
        self.predictions_total.inc();
    }

    /// Increment cache lookup counter
    pub fn inc_cache_lookup(&self, outcome: &str) {
        self.cache_lookups_total.with_label_values(&[outcome]).inc();
    }

    pub fn predictions_served(&self) -> u64 {
        self.predictions_total.get() as u64
    }
}
