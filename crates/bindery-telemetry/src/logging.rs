//! Structured logging for Bindery.
//!
//! Registration and binding emit `tracing` events and spans. This module
//! installs a `tracing-subscriber` formatter for them.
//!
//! | Target | Level | What |
//! |--------|-------|------|
//! | `bindery_core` | debug | Schema construction |
//! | `bindery_extract` | debug | Unreadable sections, failed dependencies |
//! | `bindery_router` | info | View registration |
//! | `bindery_router` | debug | `bind` span per request |
//!
//! # Example
//!
//! ```rust,ignore
//! use bindery_telemetry::logging::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig::development().format(LogFormat::Compact))?;
//! tracing::info!(view = "list_items", "registered");
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human-readable.
    Pretty,
    /// Single-line, human-readable.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format `{other}`, expected json, pretty or compact")),
        }
    }
}

/// The `[telemetry.logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `false` leaves any existing subscriber alone.
    pub enabled: bool,
    /// `EnvFilter` directive such as `info` or `bindery_extract=debug`.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
    /// Log span creation and close.
    pub span_events: bool,
    /// Add file and line to each event.
    pub source_location: bool,
    /// Add the event target.
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty debug output with span events and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_owned(),
            format: LogFormat::Pretty,
            span_events: true,
            source_location: true,
            target: true,
        }
    }

    /// JSON lines at info.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_owned(),
            format: LogFormat::Json,
            span_events: false,
            source_location: false,
            target: true,
        }
    }

    /// Replaces the output format.
    #[must_use]
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn layer(&self) -> TelemetryResult<Box<dyn Layer<Registry> + Send + Sync>> {
        let filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::Subscriber(format!("bad level `{}`: {e}", self.level)))?;
        let spans = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let fmt = tracing_subscriber::fmt::layer()
            .with_span_events(spans)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_target(self.target);

        Ok(match self.format {
            LogFormat::Json => fmt.json().with_filter(filter).boxed(),
            LogFormat::Pretty => fmt.pretty().with_filter(filter).boxed(),
            LogFormat::Compact => fmt.compact().with_filter(filter).boxed(),
        })
    }
}

/// Installs the global subscriber described by `config`.
///
/// Fails on a filter that does not parse, or when a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    tracing_subscriber::registry()
        .with(config.layer()?)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}
