//! Report, install and update workflows over reconciliation results.
//!
//! [`ConfigSync`] decides what to do with each [`DiffResult`] and delegates
//! every write to [`safe_copy`]. Failures are logged per entry and never
//! stop the remaining entries from being processed.
pub mod confirm;

use std::fmt;
use std::path::{Path, PathBuf};

pub use confirm::{Confirm, StdinConfirm};

use crate::logging::{EntryStatus, Log};
use crate::resources::config_file::{DiffResult, ReconciliationStatus};
use crate::resources::fs::safe_copy;

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Both sides already match.
    Matched,
    /// Both sides exist and differ (reported only).
    Differs,
    /// A side the operation needs does not exist.
    Missing,
    /// The copy was made.
    Copied {
        /// Where the overwritten content was moved, if anywhere.
        backup: Option<PathBuf>,
    },
    /// The user declined the update.
    Declined,
    /// Dry-run mode; the copy was only reported.
    DryRun,
    /// The copy or prompt failed.
    Failed(String),
}

impl EntryOutcome {
    /// Summary status for this outcome.
    #[must_use]
    pub const fn status(&self) -> EntryStatus {
        match self {
            Self::Matched => EntryStatus::Unchanged,
            Self::Differs | Self::Missing | Self::Declined => EntryStatus::Skipped,
            Self::Copied { .. } => EntryStatus::Ok,
            Self::DryRun => EntryStatus::DryRun,
            Self::Failed(_) => EntryStatus::Failed,
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            Self::Differs => Some("differs"),
            Self::Missing => Some("missing"),
            Self::Declined => Some("declined"),
            Self::Failed(message) => Some(message.as_str()),
            Self::Matched | Self::Copied { .. } | Self::DryRun => None,
        }
    }
}

/// Config synchronization engine.
pub struct ConfigSync<'a> {
    log: &'a dyn Log,
    confirm: &'a dyn Confirm,
    dry_run: bool,
}

impl fmt::Debug for ConfigSync<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSync")
            .field("confirm", &self.confirm)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> ConfigSync<'a> {
    /// Create an engine that logs to `log` and asks `confirm` before
    /// overwriting backups.
    #[must_use]
    pub fn new(log: &'a dyn Log, confirm: &'a dyn Confirm, dry_run: bool) -> Self {
        Self {
            log,
            confirm,
            dry_run,
        }
    }

    /// Describe each result without touching the filesystem.
    ///
    /// With `verbose`, the diff of every differing pair follows its line.
    pub fn report(&self, results: &[DiffResult], verbose: bool) -> Vec<EntryOutcome> {
        results
            .iter()
            .map(|r| {
                let outcome = match r.status {
                    ReconciliationStatus::Matches => {
                        self.log.info(&format!(
                            "{} matches {}",
                            r.system_path.display(),
                            r.backup_path.display()
                        ));
                        EntryOutcome::Matched
                    }
                    ReconciliationStatus::Differs => {
                        self.log.warn(&format!(
                            "{} differs from {}",
                            r.system_path.display(),
                            r.backup_path.display()
                        ));
                        if verbose {
                            self.show_diff(&r.diff_text);
                        }
                        EntryOutcome::Differs
                    }
                    ReconciliationStatus::Missing => {
                        self.log.warn(&match (r.system_exists, r.backup_exists) {
                            (false, false) => format!(
                                "Neither {} nor {} exists",
                                r.system_path.display(),
                                r.backup_path.display()
                            ),
                            (false, true) => not_found(&r.system_path),
                            _ => not_found(&r.backup_path),
                        });
                        EntryOutcome::Missing
                    }
                };
                self.record(r, outcome)
            })
            .collect()
    }

    /// Copy backups onto the system, preserving anything overwritten.
    pub fn install(&self, results: &[DiffResult]) -> Vec<EntryOutcome> {
        results
            .iter()
            .map(|r| {
                let outcome = if !r.backup_exists {
                    self.log.error(&not_found(&r.backup_path));
                    EntryOutcome::Missing
                } else if r.status == ReconciliationStatus::Matches {
                    self.log.info(&format!(
                        "{} and {} match, skipping install",
                        r.backup_path.display(),
                        r.system_path.display()
                    ));
                    EntryOutcome::Matched
                } else {
                    self.copy(&r.backup_path, &r.system_path, true)
                };
                self.record(r, outcome)
            })
            .collect()
    }

    /// Copy system files back into the backup directory after confirmation.
    ///
    /// The backup side is overwritten without a `.bak`; it is expected to be
    /// under version control.
    pub fn update(&self, results: &[DiffResult]) -> Vec<EntryOutcome> {
        results
            .iter()
            .map(|r| {
                let outcome = if !r.system_exists {
                    self.log.error(&not_found(&r.system_path));
                    EntryOutcome::Missing
                } else if r.status == ReconciliationStatus::Matches {
                    self.log.info(&format!(
                        "Files match, skipping update of {}",
                        r.backup_path.display()
                    ));
                    EntryOutcome::Matched
                } else {
                    self.confirm_update(r)
                };
                self.record(r, outcome)
            })
            .collect()
    }

    fn confirm_update(&self, r: &DiffResult) -> EntryOutcome {
        if self.dry_run {
            return self.copy(&r.system_path, &r.backup_path, false);
        }

        if r.backup_exists {
            self.log.warn(&format!(
                "{} differs from {}",
                r.system_path.display(),
                r.backup_path.display()
            ));
            self.show_diff(&r.diff_text);
        } else {
            self.log.warn(&not_found(&r.backup_path));
        }

        let prompt = format!(
            "Update {} with {} (< is backup, > is system)? [y/N]: ",
            r.backup_path.display(),
            r.system_path.display()
        );
        match self.confirm.confirm(&prompt, false) {
            Ok(true) => self.copy(&r.system_path, &r.backup_path, false),
            Ok(false) => {
                self.log
                    .info(&format!("Skipping update of {}", r.backup_path.display()));
                EntryOutcome::Declined
            }
            Err(e) => {
                let message = format!("failed to read answer: {e}");
                self.log.error(&message);
                EntryOutcome::Failed(message)
            }
        }
    }

    fn copy(&self, source: &Path, destination: &Path, safe: bool) -> EntryOutcome {
        if self.dry_run {
            self.log.dry_run(&format!(
                "Would copy {} to {}",
                source.display(),
                destination.display()
            ));
            return EntryOutcome::DryRun;
        }

        self.log.info(&format!(
            "Copying {} to {}",
            source.display(),
            destination.display()
        ));
        match safe_copy(source, destination, safe) {
            Ok(report) => {
                if let Some(backup) = &report.backup {
                    self.log.debug(&format!(
                        "previous {} kept at {}",
                        destination.display(),
                        backup.display()
                    ));
                }
                EntryOutcome::Copied {
                    backup: report.backup,
                }
            }
            Err(e) => {
                self.log.error(&e.to_string());
                EntryOutcome::Failed(e.to_string())
            }
        }
    }

    fn show_diff(&self, diff_text: &str) {
        for line in diff_text.lines() {
            self.log.info(line);
        }
    }

    fn record(&self, result: &DiffResult, outcome: EntryOutcome) -> EntryOutcome {
        self.log
            .record_entry(&result.name, outcome.status(), outcome.detail());
        outcome
    }
}

fn not_found(path: &Path) -> String {
    format!("{} does not exist", path.display())
}
