//! Metrics sink
//!
//! Dispatch and abort outcomes are reported through [`MetricsSink`]. The
//! default sink emits them as structured tracing events under the
//! `runway_metrics` target.

use std::error::Error;

pub trait MetricsSink: Send + Sync {
    fn record_dispatch(&self, script_type: &str, error: Option<&(dyn Error + 'static)>);

    fn record_abort(&self, script_type: &str, error: Option<&(dyn Error + 'static)>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

fn outcome(error: Option<&(dyn Error + 'static)>) -> &'static str {
    if error.is_some() { "error" } else { "success" }
}

impl MetricsSink for TracingMetrics {
    fn record_dispatch(&self, script_type: &str, error: Option<&(dyn Error + 'static)>) {
        tracing::info!(
            target: "runway_metrics",
            metric = "execution_dispatch",
            script_type,
            outcome = outcome(error),
            error = error.map(tracing::field::display),
        );
    }

    fn record_abort(&self, script_type: &str, error: Option<&(dyn Error + 'static)>) {
        tracing::info!(
            target: "runway_metrics",
            metric = "execution_abort",
            script_type,
            outcome = outcome(error),
            error = error.map(tracing::field::display),
        );
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_dispatch(&self, _script_type: &str, _error: Option<&(dyn Error + 'static)>) {}

    fn record_abort(&self, _script_type: &str, _error: Option<&(dyn Error + 'static)>) {}
}
