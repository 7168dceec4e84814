//! Diagnostic Sink
//!
//! Structural problems found while dispatching (bad priority phase, trigger
//! type with no handler) are reported here and never abort a tick.

use std::fmt;
use std::sync::{Arc, Mutex};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn, error};

/// Diagnostic severity, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Inventory dumps and other detail
    Verbose,
    /// Normal operation
    Info,
    /// Ignored configuration
    Warning,
    /// Dropped work
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Severity::Verbose => "VERBOSE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        f.write_str(tag)
    }
}

/// Receiver for dispatcher diagnostics.
pub trait DiagnosticSink {
    /// Record one message.
    fn emit(&self, severity: Severity, message: &str);
}

/// Sink that forwards to `tracing`, tagged with the map name.
#[derive(Clone, Debug, Default)]
pub struct TracingSink {
    map: String,
}

impl TracingSink {
    /// Create a sink for the named map.
    pub fn new(map: impl Into<String>) -> Self {
        Self { map: map.into() }
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        let map = self.map.as_str();
        match severity {
            Severity::Verbose => debug!(map = %map, "{}", message),
            Severity::Info => info!(map = %map, "{}", message),
            Severity::Warning => warn!(map = %map, "{}", message),
            Severity::Error => error!(map = %map, "{}", message),
        }
    }
}

/// Sink that keeps every message in memory.
///
/// Clones share the same buffer, so one handle can be given to a map and
/// another kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far.
    pub fn records(&self) -> Vec<(Severity, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages at exactly this severity.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    /// Drop all records.
    pub fn clear(&self) {
        match self.records.lock() {
            Ok(mut records) => records.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, severity: Severity, message: &str) {
        match self.records.lock() {
            Ok(mut records) => records.push((severity, message.to_string())),
            Err(poisoned) => poisoned.into_inner().push((severity, message.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Verbose < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_memory_sink_clones_share_records() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.emit(Severity::Error, "no handler");
        sink.emit(Severity::Verbose, "inventory");

        assert_eq!(handle.records().len(), 2);
        assert_eq!(handle.messages(Severity::Error), vec!["no handler".to_string()]);

        handle.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        TracingSink::new("start").emit(Severity::Warning, "ignored");
    }
}
