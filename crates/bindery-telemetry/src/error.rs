//! Installation errors.

use thiserror::Error;

/// A global subscriber or recorder could not be installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The `tracing` subscriber was rejected, or its filter did not parse.
    #[error("log subscriber not installed: {0}")]
    Subscriber(String),

    /// The Prometheus recorder was rejected.
    #[error("metrics recorder not installed: {0}")]
    Recorder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_subsystem() {
        let err = TelemetryError::Recorder("a recorder is already set".to_owned());
        assert_eq!(
            err.to_string(),
            "metrics recorder not installed: a recorder is already set"
        );
        assert!(TelemetryError::Subscriber("bad filter".to_owned())
            .to_string()
            .starts_with("log subscriber"));
    }
}
