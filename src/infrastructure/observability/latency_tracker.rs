use prometheus::Histogram;
use std::time::Instant;

/// Records the lifetime of a request into a histogram when dropped.
///
/// Observes on every exit path, early `?` returns included.
pub struct LatencyGuard<'a> {
    start: Instant,
    histogram: &'a Histogram,
}

impl<'a> LatencyGuard<'a> {
    pub fn start(histogram: &'a Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }
}

impl Drop for LatencyGuard<'_> {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
