//! Backup-preserving copy primitive.
//!
//! [`safe_copy`] is the only function in the crate that overwrites files.
//! Before anything at the destination is replaced, its previous content is
//! moved to a `.bak` sibling, and older backups are pushed further out along
//! the chain `dest.bak`, `dest.bak.bak`, and so on.
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::FsError;

/// Maximum number of occupied slots (the destination included) that a safe
/// copy will shift outward before giving up.
pub const MAX_BACKUP_CHAIN: usize = 32;

/// Outcome of a successful [`safe_copy`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CopyReport {
    /// Where the destination's previous content was moved, if it existed
    /// and the copy was made in safe mode.
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Dir,
}

/// Occupancy and kind of `path`.
///
/// A dangling symlink occupies its slot and counts as a file, so nothing is
/// ever written through it.
fn kind_of(path: &Path) -> Result<Option<Kind>, FsError> {
    match fs::symlink_metadata(path) {
        Ok(_) if path.is_dir() => Ok(Some(Kind::Dir)),
        Ok(_) => Ok(Some(Kind::File)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FsError::io("inspect", path)(e)),
    }
}

/// Lexically normalize `path`: drop `.` components and trailing separators,
/// and fold `..` into the preceding component where there is one.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.into_iter().collect()
}

/// The backup slot for `path`: its normalized form with `.bak` appended.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use archutil::resources::fs::backup_path;
///
/// assert_eq!(backup_path(Path::new("/etc/foo/")), PathBuf::from("/etc/foo.bak"));
/// ```
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = normalize(path).into_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns [`FsError::Io`] if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), FsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(FsError::io("create directory", parent))?;
    }
    Ok(())
}

/// Copy `source` to `destination`.
///
/// In safe mode an existing destination is first relocated to
/// [`backup_path`]`(destination)`, shifting any existing backups outward.
/// Every occupied slot must be the same kind as `source`; the whole chain is
/// checked before the first rename. With `safe == false` an existing
/// destination is removed instead.
///
/// The copy is staged in a hidden sibling of `destination` and renamed into
/// place only once it is complete, so a failed copy leaves the destination
/// and its backups as they were. Missing parent directories of
/// `destination` are created. Directory sources are copied recursively;
/// file sources keep their permission bits.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `source` does not exist.
/// - [`FsError::KindMismatch`] if a slot in the backup chain is a file where
///   `source` is a directory or vice versa.
/// - [`FsError::BackupChainExhausted`] if [`MAX_BACKUP_CHAIN`] slots are all
///   occupied.
/// - [`FsError::Io`] for any underlying filesystem failure.
pub fn safe_copy(source: &Path, destination: &Path, safe: bool) -> Result<CopyReport, FsError> {
    let source_kind = kind_of(source)?.ok_or_else(|| FsError::NotFound {
        path: source.to_path_buf(),
    })?;

    let occupied = kind_of(destination)?.is_some();
    let chain = if occupied && safe {
        Some(backup_chain(source, source_kind, destination)?)
    } else {
        None
    };

    ensure_parent_dir(destination)?;
    let staging = staging_path(destination);
    if kind_of(&staging)?.is_some() {
        remove_path(&staging)?;
    }
    let staged = match source_kind {
        Kind::Dir => copy_dir_recursive(source, &staging),
        Kind::File => copy_file(source, &staging),
    };
    if let Err(e) = staged {
        discard(&staging);
        return Err(e);
    }

    let mut report = CopyReport::default();
    let moved = match (&chain, occupied) {
        (Some(chain), _) => match shift(chain) {
            Ok(moved) => {
                report.backup = Some(backup_path(destination));
                moved
            }
            Err(e) => {
                discard(&staging);
                return Err(e);
            }
        },
        (None, true) => {
            if let Err(e) = remove_path(destination) {
                discard(&staging);
                return Err(e);
            }
            Vec::new()
        }
        (None, false) => Vec::new(),
    };

    if let Err(e) = fs::rename(&staging, destination) {
        discard(&staging);
        restore(&moved);
        return Err(FsError::io("move into place", destination)(e));
    }
    Ok(report)
}

/// Occupied slots starting at `destination`, followed by the first free one.
///
/// Nothing is moved; this only validates the chain.
fn backup_chain(
    source: &Path,
    source_kind: Kind,
    destination: &Path,
) -> Result<Vec<PathBuf>, FsError> {
    let mut slots = Vec::new();
    let mut slot = destination.to_path_buf();
    while let Some(kind) = kind_of(&slot)? {
        if kind != source_kind {
            return Err(FsError::KindMismatch {
                source_path: source.to_path_buf(),
                destination: slot,
            });
        }
        if slots.len() == MAX_BACKUP_CHAIN {
            return Err(FsError::BackupChainExhausted {
                path: destination.to_path_buf(),
                limit: MAX_BACKUP_CHAIN,
            });
        }
        let next = backup_path(&slot);
        slots.push(slot);
        slot = next;
    }
    slots.push(slot);
    Ok(slots)
}

/// Shift every occupied slot of `chain` one step outward, outermost first so
/// no rename lands on an occupied slot. Returns the `(from, to)` renames made.
///
/// A failure part way through undoes the renames already made.
fn shift(chain: &[PathBuf]) -> Result<Vec<(PathBuf, PathBuf)>, FsError> {
    let mut moved = Vec::new();
    for pair in chain.windows(2).rev() {
        let [from, to] = pair else { continue };
        if let Err(e) = fs::rename(from, to) {
            restore(&moved);
            return Err(FsError::io("rename", from)(e));
        }
        moved.push((from.clone(), to.clone()));
    }
    Ok(moved)
}

/// Undo `moved` renames, most recent first. Best effort.
fn restore(moved: &[(PathBuf, PathBuf)]) {
    for (from, to) in moved.iter().rev() {
        let _ = fs::rename(to, from);
    }
}

fn copy_file(source: &Path, destination: &Path) -> Result<(), FsError> {
    fs::copy(source, destination).map_err(FsError::io("copy to", destination))?;
    Ok(())
}

/// Hidden sibling of `destination` that receives the copy before it is
/// moved into place.
fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Remove a partially written staging path. Best effort.
fn discard(staging: &Path) {
    if kind_of(staging).ok().flatten().is_some() {
        let _ = remove_path(staging);
    }
}

fn remove_path(path: &Path) -> Result<(), FsError> {
    let is_real_dir = fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .map_err(FsError::io("inspect", path))?;
    if is_real_dir {
        fs::remove_dir_all(path).map_err(FsError::io("remove", path))
    } else {
        fs::remove_file(path).map_err(FsError::io("remove", path))
    }
}

/// Recursively copy a directory tree into a destination that must not exist.
///
/// Symlinks within the source tree are *followed*: directory symlinks are
/// recursed into and their contents materialised rather than copying the
/// link itself.
///
/// # Errors
///
/// Returns [`FsError::DestinationExists`] if `dst` exists, or
/// [`FsError::Io`] if a directory cannot be created or read, or a file
/// cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), FsError> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(FsError::DestinationExists {
            path: dst.to_path_buf(),
        });
    }
    copy_tree(src, dst)
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), FsError> {
    fs::create_dir_all(dst).map_err(FsError::io("create directory", dst))?;
    for entry in fs::read_dir(src).map_err(FsError::io("read directory", src))? {
        let entry = entry.map_err(FsError::io("read entry in", src))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(FsError::io("copy to", &dst_path))?;
        }
    }
    Ok(())
}
