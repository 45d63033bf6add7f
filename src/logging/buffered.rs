//! In-memory logger that collects messages instead of printing them.
use std::sync::Mutex;

use super::types::{EntryRecord, EntryStatus, Log};

/// Severity of a buffered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A stage header.
    Stage,
    /// An informational message.
    Info,
    /// A debug message.
    Debug,
    /// A warning.
    Warn,
    /// An error.
    Error,
    /// A dry-run action.
    DryRun,
}

/// A single buffered log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity the message was logged with.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

/// Implement the display methods of [`Log`] by buffering each message with
/// the corresponding [`Severity`].
macro_rules! buffer_log_methods {
    ($($method:ident => $severity:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                if let Ok(mut guard) = self.messages.lock() {
                    guard.push(LogEntry {
                        severity: Severity::$severity,
                        message: msg.to_string(),
                    });
                }
            }
        )+
    };
}

/// Logger that captures messages and entry records in memory.
///
/// Tests hand it to the sync engine and commands in place of [`Logger`]
/// and inspect what was logged with [`messages`](Self::messages).
///
/// [`Logger`]: super::logger::Logger
#[derive(Debug, Default)]
pub struct BufferedLog {
    messages: Mutex<Vec<LogEntry>>,
    records: Mutex<Vec<EntryRecord>>,
}

impl BufferedLog {
    /// Create an empty buffered logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a clone of every buffered message, in logging order.
    #[must_use]
    pub fn messages(&self) -> Vec<LogEntry> {
        self.messages.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Return the text of every message logged with `severity`.
    #[must_use]
    pub fn lines(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message)
            .collect()
    }

    /// Return a clone of every recorded entry outcome.
    #[must_use]
    pub fn records(&self) -> Vec<EntryRecord> {
        self.records.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}

impl Log for BufferedLog {
    buffer_log_methods!(
        stage => Stage,
        info => Info,
        debug => Debug,
        warn => Warn,
        error => Error,
        dry_run => DryRun,
    );

    fn record_entry(&self, name: &str, status: EntryStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(EntryRecord {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
