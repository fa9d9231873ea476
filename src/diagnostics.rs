//! Diagnostics sink for registry, middleware, and agent observability.
//!
//! Core types never write to a process-wide logger directly. They report
//! through an injected [`DiagnosticsSink`], so embedders can route skill
//! system output into their own logging setup, and tests can assert on
//! warnings without capturing global logger state. The default sink
//! forwards to the `log` crate facade.

use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for skill system diagnostics.
///
/// Diagnostics are observability only. No code path changes behavior based
/// on what a sink does with a message.
pub trait DiagnosticsSink: Send + Sync {
    /// Report routine progress (discovery counts, exposure snapshots).
    fn info(&self, message: &str);

    /// Report a recoverable problem (overwritten registration, skipped
    /// skill directory).
    fn warn(&self, message: &str);

    /// Report a failure that was isolated but lost work (factory panic-free
    /// error, unreadable manifest).
    fn error(&self, message: &str);
}

/// Default sink: forwards to the `log` crate under the `skillgate` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn info(&self, message: &str) {
        log::info!(target: "skillgate", "{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "skillgate", "{}", message);
    }

    fn error(&self, message: &str) {
        log::error!(target: "skillgate", "{}", message);
    }
}

/// Severity recorded alongside each captured message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Sink that records messages in memory.
///
/// Used by tests to assert that a warning was (or was not) emitted, and by
/// embedders that surface diagnostics in a UI instead of a log file.
#[derive(Debug, Default)]
pub struct CaptureSink {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl CaptureSink {
    /// Create an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages in emission order.
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().clone()
    }

    /// Captured messages of one severity.
    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any captured message of the given severity contains `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages
            .lock()
            .iter()
            .any(|(s, m)| *s == severity && m.contains(needle))
    }

    /// Drop all captured messages.
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl DiagnosticsSink for CaptureSink {
    fn info(&self, message: &str) {
        self.messages.lock().push((Severity::Info, message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().push((Severity::Warn, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.messages.lock().push((Severity::Error, message.to_string()));
    }
}

/// Shared handle to the default sink.
pub fn default_sink() -> Arc<dyn DiagnosticsSink> {
    Arc::new(LogSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_records_in_order() {
        let sink = CaptureSink::new();
        sink.info("first");
        sink.warn("second");
        sink.error("third");

        let messages = sink.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], (Severity::Info, "first".to_string()));
        assert_eq!(messages[1], (Severity::Warn, "second".to_string()));
        assert_eq!(messages[2], (Severity::Error, "third".to_string()));
    }

    #[test]
    fn test_capture_sink_contains() {
        let sink = CaptureSink::new();
        sink.warn("skill 'math' overwritten");

        assert!(sink.contains(Severity::Warn, "overwritten"));
        assert!(!sink.contains(Severity::Error, "overwritten"));
        assert!(!sink.contains(Severity::Warn, "missing"));
    }

    #[test]
    fn test_capture_sink_clear() {
        let sink = CaptureSink::new();
        sink.info("something");
        sink.clear();
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_log_sink_is_usable_as_trait_object() {
        let sink: Arc<dyn DiagnosticsSink> = default_sink();
        // Smoke test: forwards without panicking even when no logger is set.
        sink.info("info");
        sink.warn("warn");
        sink.error("error");
    }
}
