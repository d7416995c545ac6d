//! Warning/info sink injected into the coordinator and balancer, plus
//! `tracing` subscriber setup for the binary.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Severe,
}

/// A single message captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
}

/// Destination for user-facing warnings and informational messages.
///
/// Implementations must be shareable across balancer worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Severity::Warning, message);
    }

    fn severe(&self, message: &str) {
        self.emit(Severity::Severe, message);
    }
}

/// Forwards messages to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Severe => tracing::error!("{message}"),
        }
    }
}

/// Records messages in memory, optionally forwarding them to `tracing` too.
///
/// Used by tests and by the TUI log pane. With a limit set, the oldest
/// records are dropped once the buffer is full.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<VecDeque<LogRecord>>,
    forward: bool,
    limit: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that also forwards every message to [`TracingSink`].
    pub fn forwarding() -> Self {
        Self {
            forward: true,
            ..Self::default()
        }
    }

    /// Keeps at most `limit` records.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns a copy of all recorded messages in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Returns the last `n` recorded messages.
    pub fn tail(&self, n: usize) -> Vec<LogRecord> {
        let records = self.records.lock();
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    /// Returns `true` if any message at `severity` contains `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.severity == severity && r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, severity: Severity, message: &str) {
        if self.forward {
            TracingSink.emit(severity, message);
        }
        let mut records = self.records.lock();
        if self.limit == Some(0) {
            return;
        }
        if let Some(limit) = self.limit {
            while records.len() >= limit {
                records.pop_front();
            }
        }
        records.push_back(LogRecord {
            severity,
            message: message.to_string(),
        });
    }
}

/// Returns the default sink used by the binary.
pub fn tracing_sink() -> Arc<dyn EventSink> {
    Arc::new(TracingSink)
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. When `config.file` is set,
/// output is appended to that file without ANSI colors; otherwise it goes to
/// stderr so it does not interleave with menu output on stdout.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log file cannot be opened,
/// or a global subscriber is already installed.
pub fn init_tracing(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    match config.file.as_deref() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(Path::new(path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.info("first");
        sink.warning("second");
        sink.severe("third");

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].severity, Severity::Info);
        assert_eq!(records[2].message, "third");
        assert!(sink.contains(Severity::Warning, "sec"));
        assert!(!sink.contains(Severity::Info, "sec"));
    }

    #[test]
    fn tail_returns_latest_records() {
        let sink = MemorySink::new();
        for i in 0..5 {
            sink.info(&format!("msg {i}"));
        }
        let tail = sink.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].message, "msg 3");
        assert_eq!(sink.tail(10).len(), 5);

        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn limited_sink_drops_oldest_records() {
        let sink = MemorySink::new().with_limit(3);
        for i in 0..10 {
            sink.info(&format!("msg {i}"));
        }
        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "msg 7");
        assert_eq!(records[2].message, "msg 9");
        assert!(!sink.contains(Severity::Info, "msg 0"));
    }
}
