//! Prometheus metrics for analyticsd itself.
//!
//! These describe the ingest service (request outcomes, rejection reasons,
//! latency), not the analytics data it stores. Served on `GET /metrics`.
//!
//! - `analytics_requests_total{route,outcome}` - Requests by route and outcome
//! - `analytics_rejections_total{route,reason}` - Refused reports by reason code
//! - `analytics_request_duration_seconds{route}` - Handler latency histogram
//! - `analytics_command_uses_total` - Accepted command usage reports

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Requests handled, by route and outcome (`ok`, `rejected`, `unauthorized`).
pub static REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Rejected reports, by route and reason code.
pub static REJECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Command usage reports that incremented a counter.
pub static COMMAND_USES: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Handler latency by route.
pub static REQUEST_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded. Calling
/// it again is harmless: already-set metrics are kept.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(REQUESTS, IntCounterVec::new(Opts::new("analytics_requests_total", "Ingest requests by route and outcome"), &["route", "outcome"]));
    register!(REJECTIONS, IntCounterVec::new(Opts::new("analytics_rejections_total", "Rejected reports by route and reason"), &["route", "reason"]));
    register!(COMMAND_USES, IntCounter::new("analytics_command_uses_total", "Accepted command usage reports"));
    register!(REQUEST_LATENCY, HistogramVec::new(
        HistogramOpts::new("analytics_request_duration_seconds", "Ingest handler latency by route")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["route"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record a request outcome for a route.
pub fn record_request(route: &str, outcome: &str) {
    if let Some(m) = REQUESTS.get() {
        m.with_label_values(&[route, outcome]).inc();
    }
}

/// Record a rejected report with its reason code.
pub fn record_rejection(route: &str, reason: &str) {
    if let Some(m) = REJECTIONS.get() {
        m.with_label_values(&[route, reason]).inc();
    }
}

/// Record an accepted command usage report.
pub fn record_command_use() {
    if let Some(m) = COMMAND_USES.get() {
        m.inc();
    }
}

/// Record handler latency for a route.
pub fn record_latency(route: &str, duration_secs: f64) {
    if let Some(m) = REQUEST_LATENCY.get() {
        m.with_label_values(&[route]).observe(duration_secs);
    }
}
