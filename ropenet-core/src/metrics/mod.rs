//! Metrics for observability
//!
//! Counters and histograms go through the `metrics` facade; without an
//! installed recorder they are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const MUTATIONS_APPLIED: &str = "store.mutations.applied";
pub const MUTATIONS_REJECTED: &str = "store.mutations.rejected";
pub const INSTANCE_SWITCHES: &str = "store.instance.switches";
pub const NOTIFICATIONS_EMITTED: &str = "generator.notifications.emitted";
pub const REQUEST_DURATION: &str = "boundary.request.duration_ms";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(MUTATIONS_APPLIED, "Mutations that changed store state");
    describe_counter!(MUTATIONS_REJECTED, "Mutations rejected before touching state");
    describe_counter!(INSTANCE_SWITCHES, "Active instance switches");
    describe_counter!(NOTIFICATIONS_EMITTED, "Notifications injected by the generator");
    describe_histogram!(REQUEST_DURATION, "Boundary request duration in milliseconds");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Record a histogram metric
pub fn record_histogram(name: &'static str, value: f64) {
    histogram!(name).record(value);
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new(name: &'static str) -> Self {
        Self { name, start: Instant::now() }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        record_histogram(self.name, self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder() {
        init_metrics();
        record_counter(MUTATIONS_APPLIED, 1);
        record_histogram(REQUEST_DURATION, 1.5);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::new(REQUEST_DURATION);
        std::thread::sleep(std::time::Duration::from_millis(1));
        timer.stop();
    }
}
