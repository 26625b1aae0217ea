//! Pull-based observability for the prediction service
//!
//! Metrics live in a registry owned by [`Metrics`] and are exposed through
//! `GET /metrics`. Nothing is registered in the prometheus default registry.

pub mod latency_tracker;
pub mod metrics;

pub use latency_tracker::LatencyGuard;
pub use metrics::Metrics;
