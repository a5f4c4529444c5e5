//! Observability channel for recoverable conditions.
//!
//! Checked indicators report conditions that do not stop the computation
//! (sampling-frequency mismatch, a same-family but unexpected input kind)
//! through a [`NoticeSink`]. The default sink forwards to `tracing`;
//! [`CollectingSink`] keeps the notices in memory so callers can inspect them.

use std::sync::{Arc, Mutex};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Informational.
    Info,
    /// A recoverable problem with the inputs.
    Warning,
    /// A problem the caller should not ignore.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single `(severity, message)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// How serious the condition is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

/// A sink accepting notices. Implementations must be shareable across
/// concurrent indicator invocations.
pub trait NoticeSink: Send + Sync {
    /// Receive one notice.
    fn emit(&self, severity: Severity, message: &str);
}

/// Forwards notices to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "climind::notice", "{message}"),
            Severity::Info => tracing::info!(target: "climind::notice", "{message}"),
            Severity::Warning => tracing::warn!(target: "climind::notice", "{message}"),
            Severity::Error => tracing::error!(target: "climind::notice", "{message}"),
        }
    }
}

/// Records every notice it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sink behind an `Arc`, ready to be shared.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// A snapshot of the notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Notices at or above `severity`.
    pub fn at_least(&self, severity: Severity) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.severity >= severity)
            .collect()
    }

    /// Drop all recorded notices.
    pub fn clear(&self) {
        match self.notices.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl NoticeSink for CollectingSink {
    fn emit(&self, severity: Severity, message: &str) {
        let notice = Notice {
            severity,
            message: message.to_string(),
        };
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

impl<S: NoticeSink + ?Sized> NoticeSink for Arc<S> {
    fn emit(&self, severity: Severity, message: &str) {
        (**self).emit(severity, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_records_in_order() {
        let sink = CollectingSink::new();
        sink.emit(Severity::Info, "first");
        sink.emit(Severity::Warning, "second");
        let got = sink.notices();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].message, "first");
        assert_eq!(got[1].severity, Severity::Warning);
        assert_eq!(sink.at_least(Severity::Warning).len(), 1);
        sink.clear();
        assert!(sink.notices().is_empty());
    }

    #[test]
    fn shared_sink_through_arc() {
        let sink = CollectingSink::shared();
        let as_dyn: Arc<dyn NoticeSink> = sink.clone();
        as_dyn.emit(Severity::Warning, "via trait object");
        assert_eq!(sink.notices().len(), 1);
    }

    #[test]
    fn tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.emit(Severity::Error, "nobody listens");
    }
}
