//! Error telemetry port.
//!
//! A fire-and-forget sink for unexpected conditions worth looking at later.
//! Implementations must never block or fail.

use tracing::{error, warn};

/// Port for reporting errors and notable messages.
pub trait TelemetryPort: Send + Sync {
    /// Report an error.
    fn report_error(&self, error: &(dyn std::error::Error + Send + Sync));

    /// Report a free-form message.
    fn report_message(&self, message: &str);
}

/// Telemetry sink that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn report_error(&self, _error: &(dyn std::error::Error + Send + Sync)) {}

    fn report_message(&self, _message: &str) {}
}

/// Telemetry sink that forwards to `tracing` under the `folio.telemetry` target.
#[derive(Debug, Clone, Default)]
pub struct TracingTelemetry;

impl TelemetryPort for TracingTelemetry {
    fn report_error(&self, error: &(dyn std::error::Error + Send + Sync)) {
        error!(target: "folio.telemetry", error = %error, "reported error");
    }

    fn report_message(&self, message: &str) {
        warn!(target: "folio.telemetry", "{message}");
    }
}

/// Telemetry sink that records reports for assertions.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    errors: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    messages: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered errors reported so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages reported so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl TelemetryPort for RecordingTelemetry {
    fn report_error(&self, error: &(dyn std::error::Error + Send + Sync)) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error.to_string());
        }
    }

    fn report_message(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_telemetry_captures_reports() {
        let telemetry = RecordingTelemetry::new();
        let err = std::io::Error::other("disk on fire");

        telemetry.report_error(&err);
        telemetry.report_message("hash mismatch");

        assert_eq!(telemetry.errors(), vec!["disk on fire".to_string()]);
        assert_eq!(telemetry.messages(), vec!["hash mismatch".to_string()]);
    }

    #[test]
    fn test_clones_share_storage() {
        let telemetry = RecordingTelemetry::new();
        let clone = telemetry.clone();
        clone.report_message("from clone");
        assert_eq!(telemetry.messages().len(), 1);
    }

    #[test]
    fn test_noop_does_nothing() {
        let telemetry = NoopTelemetry;
        telemetry.report_message("ignored");
        telemetry.report_error(&std::io::Error::other("ignored"));
    }
}
