//! Logs and metrics for Bindery.
//!
//! Binding code logs through `tracing` and counts through the recording
//! functions in [`metrics`]. Nothing is emitted until a subscriber and a
//! recorder exist, either from [`init_telemetry`] or from the application.
//!
//! A scrape of the recorder installed here looks like:
//!
//! ```text
//! # TYPE bindery_bind_total counter
//! bindery_bind_total{view="list_items",outcome="ok"} 1234
//! bindery_bind_total{view="list_items",outcome="invalid"} 56
//! bindery_bind_errors_total{view="list_items",kind="query"} 56
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

use serde::{Deserialize, Serialize};

pub use crate::error::TelemetryError;
pub use crate::logging::{init_logging, LogConfig, LogFormat};
pub use crate::metrics::{init_metrics, render_metrics, BindOutcome, MetricsConfig};

/// Result of installing a subsystem.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// The `[telemetry]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `[telemetry.logging]`.
    pub logging: LogConfig,
    /// `[telemetry.metrics]`.
    pub metrics: MetricsConfig,
}

/// Installs the log subscriber, then the metrics recorder. A disabled
/// subsystem is skipped.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
