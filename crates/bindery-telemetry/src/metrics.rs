//! Prometheus metrics for Bindery.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `bindery_bind_total` | Counter | `view`, `outcome` | Bound requests by outcome |
//! | `bindery_bind_duration_seconds` | Histogram | `view` | Time spent binding |
//! | `bindery_bind_errors_total` | Counter | `view`, `kind` | Field errors by provenance |
//! | `bindery_dependency_calls_total` | Counter | `dependency` | Dependency invocations |
//! | `bindery_dependency_cache_hits_total` | Counter | `dependency` | Results served from the request cache |
//!
//! Recording is a no-op until a recorder is installed, either globally with
//! [`init_metrics`] or scoped with `metrics::with_local_recorder`.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::TelemetryResult;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Bind outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Every field validated and the handler ran.
    Ok,
    /// Binding produced errors and the error handler ran.
    Invalid,
}

impl BindOutcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Invalid => "invalid",
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Installs the global Prometheus recorder and describes the standard
/// metrics.
///
/// Fails if another global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::Recorder(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();
    Ok(())
}

/// Renders the global recorder in Prometheus text format, or `None` before
/// [`init_metrics`].
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics with the current
/// recorder.
pub fn describe_metrics() {
    describe_counter!("bindery_bind_total", "Requests bound, by view and outcome");
    describe_histogram!(
        "bindery_bind_duration_seconds",
        "Time spent parsing and validating request parameters"
    );
    describe_counter!(
        "bindery_bind_errors_total",
        "Field errors reported, by view and provenance kind"
    );
    describe_counter!(
        "bindery_dependency_calls_total",
        "Dependency invocations"
    );
    describe_counter!(
        "bindery_dependency_cache_hits_total",
        "Dependency results served from the per-request cache"
    );
}

/// Records one bound request.
pub fn record_bind(view: &str, outcome: BindOutcome, duration: Duration) {
    counter!(
        "bindery_bind_total",
        "view" => view.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("bindery_bind_duration_seconds", "view" => view.to_string())
        .record(duration.as_secs_f64());
}

/// Records one field error of provenance `kind`.
pub fn record_bind_error(view: &str, kind: &str) {
    counter!(
        "bindery_bind_errors_total",
        "view" => view.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Records one dependency invocation.
pub fn record_dependency_call(dependency: &str) {
    counter!(
        "bindery_dependency_calls_total",
        "dependency" => dependency.to_string()
    )
    .increment(1);
}

/// Records one dependency result served from the cache.
pub fn record_dependency_cache_hit(dependency: &str) {
    counter!(
        "bindery_dependency_cache_hits_total",
        "dependency" => dependency.to_string()
    )
    .increment(1);
}
