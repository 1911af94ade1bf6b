//! Request tracing utilities.

use std::future::Future;
use tracing::{debug_span, info_span, Instrument, Span};

/// Create a span for one logical API call.
pub fn request_span(method: &str, endpoint: &str) -> Span {
    info_span!(
        "api_request",
        method = %method,
        endpoint = %endpoint,
        attempt = tracing::field::Empty,
        error = tracing::field::Empty
    )
}

/// Create a span for a credential store operation.
pub fn store_span(operation: &str, path: &str) -> Span {
    debug_span!("credential_store", op = %operation, path = %path)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", tracing::field::display(error));
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Time elapsed since the timer started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    /// Complete the timer and record duration.
    pub fn finish(self) {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
    }
}
