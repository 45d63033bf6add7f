//! Backup-versus-system reconciliation of config files.
//!
//! [`reconcile`] pairs every manifest entry's backup copy with its live
//! system copy and classifies the pair. It never writes; acting on the
//! results is left to [`crate::sync::ConfigSync`].
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use similar::{DiffOp, TextDiff};

use crate::config::ConfigFile;
use crate::error::FsError;

const NO_NEWLINE: &str = "\\ No newline at end of file\n";

/// Classification of a backup/system pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationStatus {
    /// Both copies exist with identical content.
    Matches,
    /// Both copies exist and differ.
    Differs,
    /// At least one copy does not exist.
    Missing,
}

/// Comparison result for one manifest entry.
///
/// `status` is [`ReconciliationStatus::Missing`] exactly when one of the
/// existence flags is false. `diff_text` is empty unless the status is
/// [`ReconciliationStatus::Differs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Logical config name.
    pub name: String,
    /// Whether the backup copy exists.
    pub backup_exists: bool,
    /// Whether the system copy exists.
    pub system_exists: bool,
    /// Pair classification.
    pub status: ReconciliationStatus,
    /// Location of the backup copy.
    pub backup_path: PathBuf,
    /// Location of the system copy.
    pub system_path: PathBuf,
    /// Normal-format diff from backup (`<`) to system (`>`).
    pub diff_text: String,
}

/// Reconcile every entry against `backup_dir`, in manifest order.
///
/// Failures are reported per entry so one unreadable file does not hide the
/// state of the others.
#[must_use]
pub fn reconcile(backup_dir: &Path, entries: &[ConfigFile]) -> Vec<Result<DiffResult, FsError>> {
    entries
        .iter()
        .map(|entry| reconcile_entry(backup_dir, entry))
        .collect()
}

/// Reconcile a single entry against `backup_dir`.
///
/// # Errors
///
/// Returns [`FsError::Io`] if either side cannot be inspected or read. A
/// missing side is not an error.
pub fn reconcile_entry(backup_dir: &Path, entry: &ConfigFile) -> Result<DiffResult, FsError> {
    let backup_path = entry.backup_path(backup_dir);
    let system_path = entry.system_path.clone();
    let backup_exists = exists(&backup_path)?;
    let system_exists = exists(&system_path)?;

    let (status, diff_text) = if backup_exists && system_exists {
        let text = compare(&backup_path, &system_path)?;
        if text.is_empty() {
            (ReconciliationStatus::Matches, text)
        } else {
            (ReconciliationStatus::Differs, text)
        }
    } else {
        (ReconciliationStatus::Missing, String::new())
    };

    Ok(DiffResult {
        name: entry.name.clone(),
        backup_exists,
        system_exists,
        status,
        backup_path,
        system_path,
        diff_text,
    })
}

/// Whether `path` exists, following symlinks (a dangling link is missing).
fn exists(path: &Path) -> Result<bool, FsError> {
    path.try_exists().map_err(FsError::io("inspect", path))
}

/// Diff two existing paths. An empty result means they are identical.
fn compare(old: &Path, new: &Path) -> Result<String, FsError> {
    let mut out = String::new();
    match (old.is_dir(), new.is_dir()) {
        (true, true) => compare_dirs(old, new, &mut out)?,
        (false, false) => compare_files(old, new, false, &mut out)?,
        (old_is_dir, _) => kind_mismatch(old, new, old_is_dir, &mut out),
    }
    Ok(out)
}

fn compare_files(old: &Path, new: &Path, header: bool, out: &mut String) -> Result<(), FsError> {
    let old_bytes = fs::read(old).map_err(FsError::io("read", old))?;
    let new_bytes = fs::read(new).map_err(FsError::io("read", new))?;
    if old_bytes == new_bytes {
        return Ok(());
    }
    match (std::str::from_utf8(&old_bytes), std::str::from_utf8(&new_bytes)) {
        (Ok(old_text), Ok(new_text)) => {
            if header {
                let _ = writeln!(out, "diff {} {}", old.display(), new.display());
            }
            out.push_str(&normal_diff(old_text, new_text));
        }
        _ => {
            let _ = writeln!(
                out,
                "Binary files {} and {} differ",
                old.display(),
                new.display()
            );
        }
    }
    Ok(())
}

fn compare_dirs(old: &Path, new: &Path, out: &mut String) -> Result<(), FsError> {
    let old_names = dir_names(old)?;
    let new_names = dir_names(new)?;
    for name in old_names.union(&new_names) {
        let old_child = old.join(name);
        let new_child = new.join(name);
        match (old_names.contains(name), new_names.contains(name)) {
            (true, false) => only_in(old, name, out),
            (false, true) => only_in(new, name, out),
            _ => match (old_child.is_dir(), new_child.is_dir()) {
                (true, true) => compare_dirs(&old_child, &new_child, out)?,
                (false, false) => compare_files(&old_child, &new_child, true, out)?,
                (old_is_dir, _) => kind_mismatch(&old_child, &new_child, old_is_dir, out),
            },
        }
    }
    Ok(())
}

fn dir_names(dir: &Path) -> Result<BTreeSet<OsString>, FsError> {
    fs::read_dir(dir)
        .map_err(FsError::io("read directory", dir))?
        .map(|entry| {
            entry
                .map(|e| e.file_name())
                .map_err(FsError::io("read entry in", dir))
        })
        .collect()
}

fn only_in(dir: &Path, name: &OsString, out: &mut String) {
    let _ = writeln!(out, "Only in {}: {}", dir.display(), name.to_string_lossy());
}

fn kind_mismatch(old: &Path, new: &Path, old_is_dir: bool, out: &mut String) {
    let (old_kind, new_kind) = if old_is_dir {
        ("directory", "regular file")
    } else {
        ("regular file", "directory")
    };
    let _ = writeln!(
        out,
        "File {} is a {old_kind} while file {} is a {new_kind}",
        old.display(),
        new.display()
    );
}

/// Render the `diff(1)` default ("normal") format between two texts.
///
/// Adjacent changes are merged into one hunk. Lines without a trailing
/// newline are followed by the `\ No newline at end of file` marker.
#[must_use]
pub fn normal_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let old_lines = diff.old_slices();
    let new_lines = diff.new_slices();

    let mut out = String::new();
    let mut hunk: Option<(Range<usize>, Range<usize>)> = None;
    for op in diff.ops() {
        if matches!(op, DiffOp::Equal { .. }) {
            if let Some((o, n)) = hunk.take() {
                write_hunk(&mut out, old_lines, o, new_lines, n);
            }
            continue;
        }
        let (o, n) = (op.old_range(), op.new_range());
        hunk = Some(match hunk {
            Some((ho, hn)) => (ho.start..o.end, hn.start..n.end),
            None => (o, n),
        });
    }
    if let Some((o, n)) = hunk {
        write_hunk(&mut out, old_lines, o, new_lines, n);
    }
    out
}

fn write_hunk(
    out: &mut String,
    old_lines: &[&str],
    old: Range<usize>,
    new_lines: &[&str],
    new: Range<usize>,
) {
    let header = match (old.is_empty(), new.is_empty()) {
        (false, false) => format!("{}c{}", line_range(&old), line_range(&new)),
        (false, true) => format!("{}d{}", line_range(&old), new.start),
        _ => format!("{}a{}", old.start, line_range(&new)),
    };
    out.push_str(&header);
    out.push('\n');

    write_lines(out, "< ", old_lines.get(old.clone()).unwrap_or_default());
    if !old.is_empty() && !new.is_empty() {
        out.push_str("---\n");
    }
    write_lines(out, "> ", new_lines.get(new).unwrap_or_default());
}

fn write_lines(out: &mut String, marker: &str, lines: &[&str]) {
    for line in lines {
        out.push_str(marker);
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
            out.push_str(NO_NEWLINE);
        }
    }
}

/// One-based line range as `diff(1)` prints it: `N` or `FIRST,LAST`.
fn line_range(range: &Range<usize>) -> String {
    if range.len() == 1 {
        format!("{}", range.start + 1)
    } else {
        format!("{},{}", range.start + 1, range.end)
    }
}
