//! Core logging types: entry records, status, and the [`Log`] trait.

/// Outcome of one manifest entry, kept for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Logical name of the entry (config name or package category).
    pub name: String,
    /// Final status of the entry.
    pub status: EntryStatus,
    /// Optional detail (e.g. skip reason or error description).
    pub message: Option<String>,
}

/// Status of a processed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// A copy was performed.
    Ok,
    /// Both sides already matched; nothing to do.
    Unchanged,
    /// The entry was deliberately left alone (declined prompt, missing side).
    Skipped,
    /// Dry-run mode; the copy that would have been made was only reported.
    DryRun,
    /// The entry could not be processed.
    Failed,
}

impl EntryStatus {
    /// Lower-case label used in the log file and summary rendering.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
            Self::DryRun => "dry run",
            Self::Failed => "failed",
        }
    }
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) forwards to the global tracing
/// subscriber; [`BufferedLog`](super::buffered::BufferedLog) keeps entries in
/// memory. Engine code logs through `&dyn Log` without knowing which one it
/// is talking to.
pub trait Log {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an entry outcome for the summary.
    fn record_entry(&self, name: &str, status: EntryStatus, message: Option<&str>);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn entry_status_equality() {
        assert_eq!(EntryStatus::Ok, EntryStatus::Ok);
        assert_ne!(EntryStatus::Ok, EntryStatus::Failed);
        assert_ne!(EntryStatus::Skipped, EntryStatus::Unchanged);
    }

    #[test]
    fn labels_are_distinct() {
        let labels = [
            EntryStatus::Ok,
            EntryStatus::Unchanged,
            EntryStatus::Skipped,
            EntryStatus::DryRun,
            EntryStatus::Failed,
        ]
        .map(EntryStatus::label);
        let unique: std::collections::BTreeSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
        assert_eq!(EntryStatus::DryRun.label(), "dry run");
    }

    #[test]
    fn entry_record_clone() {
        let entry = EntryRecord {
            name: "bashrc".to_string(),
            status: EntryStatus::Skipped,
            message: Some("declined".to_string()),
        };
        assert_eq!(entry.clone(), entry);
    }
}
