//! Domain-specific error types for archutil.
//!
//! Internal modules return typed errors (e.g. [`ManifestError`], [`FsError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! - [`ManifestError`]: manifest loading and schema validation
//! - [`FsError`]: reconciliation reads and safe copies
//! - [`PackageError`]: package selection and repository checks

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading and validating the manifest.
///
/// Every variant aborts the current subcommand before any filesystem
/// mutation happens.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("{} does not exist", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The manifest file exists but could not be read.
    #[error("IO error reading manifest {}: {source}", path.display())]
    Read {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid TOML.
    #[error("Invalid TOML in {}: {message}", path.display())]
    Parse {
        /// Path to the manifest.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// A required top-level field is absent.
    #[error("manifest must contain a {expected} called `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: String,
        /// Human-readable description of the expected shape.
        expected: &'static str,
    },

    /// A field is present but has the wrong shape.
    #[error("`{field}` must be {expected}")]
    WrongShape {
        /// Dotted path of the offending field (e.g. `packages.base`).
        field: String,
        /// Human-readable description of the expected shape.
        expected: &'static str,
    },

    /// A config file's system path is not absolute.
    #[error("system path for `{name}` must be absolute: {path}")]
    RelativePath {
        /// Logical config name.
        name: String,
        /// The offending path.
        path: String,
    },

    /// A logical config name cannot be used as a path below the backup directory.
    #[error("invalid config name `{name}`: {reason}")]
    InvalidName {
        /// Logical config name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
}

/// Errors raised by reconciliation and safe copies.
#[derive(Error, Debug)]
pub enum FsError {
    /// A copy source does not exist.
    #[error("{} does not exist", path.display())]
    NotFound {
        /// The missing source path.
        path: PathBuf,
    },

    /// A safe-copy destination exists but is a different kind than the source.
    #[error(
        "{} and {} must both be files or both be directories",
        source_path.display(),
        destination.display()
    )]
    KindMismatch {
        /// Copy source.
        source_path: PathBuf,
        /// Existing path whose kind differs.
        destination: PathBuf,
    },

    /// Every backup slot up to the chain limit is already occupied.
    #[error("no free backup slot for {} within {limit} levels", path.display())]
    BackupChainExhausted {
        /// Destination whose backups are exhausted.
        path: PathBuf,
        /// Maximum chain length that was searched.
        limit: usize,
    },

    /// A directory tree copy targeted a path that already exists.
    #[error("refusing to copy a directory tree onto existing {}", path.display())]
    DestinationExists {
        /// The occupied destination.
        path: PathBuf,
    },

    /// An underlying filesystem operation failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// What was being attempted (e.g. `"read"`, `"copy to"`).
        action: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl FsError {
    /// Build a closure that wraps an [`std::io::Error`] for `path`.
    ///
    /// Intended for `map_err` chains:
    /// `fs::read(p).map_err(FsError::io("read", p))`.
    pub fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Errors raised by the package subcommands before anything is installed.
#[derive(Error, Debug)]
pub enum PackageError {
    /// A requested category is not declared in the manifest.
    #[error("Package category {0} does not exist")]
    UnknownCategory(String),

    /// Required repositories are not enabled in pacman.conf.
    #[error(
        "The following repos must be enabled before package installation can continue: {}",
        .0.join(", ")
    )]
    MissingRepos(Vec<String>),

    /// Some declared packages are in no configured repository.
    #[error(
        "The following packages could not be found in the repos and must be removed \
         before installation can continue: {}",
        .0.join(", ")
    )]
    UnknownPackages(Vec<String>),

    /// Refreshing the package databases failed.
    #[error("Failed to update package database")]
    RefreshFailed,

    /// The configured package manager is not on `PATH`.
    #[error("Package manager {0} was not found on PATH")]
    ManagerNotFound(String),
}
