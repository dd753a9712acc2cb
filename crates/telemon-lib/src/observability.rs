//! Observability infrastructure for the telemetry agent
//!
//! Prometheus metrics about the agent itself: tick latency and outcomes,
//! recorded incidents, and the number of connected real-time clients.
//! Distinct from the host telemetry the agent exists to collect.

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;

/// Histogram buckets for tick latency (in seconds); a tick normally
/// finishes well under the one-second cadence
const TICK_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    tick_latency_seconds: Histogram,
    ticks_total: IntCounter,
    tick_errors_total: IntCounter,
    incidents_total: IntCounter,
    connected_clients: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            tick_latency_seconds: register_histogram!(
                "telemon_tick_latency_seconds",
                "Time spent sampling and publishing one telemetry tick",
                TICK_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register tick_latency_seconds"),

            ticks_total: register_int_counter!(
                "telemon_ticks_total",
                "Total number of completed telemetry ticks"
            )
            .expect("Failed to register ticks_total"),

            tick_errors_total: register_int_counter!(
                "telemon_tick_errors_total",
                "Total number of ticks skipped due to sampling errors"
            )
            .expect("Failed to register tick_errors_total"),

            incidents_total: register_int_counter!(
                "telemon_incidents_total",
                "Total number of recorded threshold incidents"
            )
            .expect("Failed to register incidents_total"),

            connected_clients: register_int_gauge!(
                "telemon_connected_clients",
                "Number of currently connected real-time clients"
            )
            .expect("Failed to register connected_clients"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record how long one tick took
    pub fn observe_tick_latency(&self, duration_secs: f64) {
        self.inner().tick_latency_seconds.observe(duration_secs);
    }

    /// Count a completed tick
    pub fn inc_ticks(&self) {
        self.inner().ticks_total.inc();
    }

    /// Count a tick skipped on a sampling error
    pub fn inc_tick_errors(&self) {
        self.inner().tick_errors_total.inc();
    }

    /// Count a recorded incident
    pub fn inc_incidents(&self) {
        self.inner().incidents_total.inc();
    }

    /// Update the connected-clients gauge
    pub fn set_connected_clients(&self, count: i64) {
        self.inner().connected_clients.set(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_records_without_panicking() {
        // Metrics live in the global Prometheus registry, so this only
        // exercises the handle surface.
        let metrics = MonitorMetrics::new();

        metrics.observe_tick_latency(0.004);
        metrics.inc_ticks();
        metrics.inc_tick_errors();
        metrics.inc_incidents();
        metrics.set_connected_clients(3);
    }
}
