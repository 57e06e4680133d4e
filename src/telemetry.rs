//! Telemetry utilities for request timing and tracing spans.

use std::time::Instant;

/// Guard for timing a route handler and recording metrics.
///
/// Records request latency when dropped.
pub struct RequestTimer {
    route: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Start timing a request.
    pub fn new(route: &'static str) -> Self {
        Self {
            route,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_latency(self.route, duration);
    }
}

/// Standardized span constructors for ingest observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one ingest request.
    pub fn request(route: &str) -> Span {
        info_span!("ingest", route = %route)
    }
}
