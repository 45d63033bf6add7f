//! Top-level subcommand orchestration.
pub mod config;
pub mod install;
pub mod list;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::{DEFAULT_MANIFEST, Manifest};
use crate::logging::Log;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Resolved location of the manifest file.
    pub manifest_path: PathBuf,
    /// The validated manifest.
    pub manifest: Manifest,
}

impl CommandSetup {
    /// Resolve and load the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing, unreadable, or invalid.
    pub fn init(global: &GlobalOpts, cwd: &Path, log: &dyn Log) -> Result<Self> {
        let manifest_path = resolve_manifest_path(global.config_path.as_deref(), cwd);

        log.debug(&format!("manifest: {}", manifest_path.display()));
        let manifest = Manifest::load(&manifest_path)?;
        log.debug(&format!(
            "{} package categories, {} config files",
            manifest.packages.len(),
            manifest.config_files.len()
        ));

        Ok(Self {
            manifest_path,
            manifest,
        })
    }

    /// Directory containing the manifest.
    #[must_use]
    pub fn manifest_dir(&self) -> &Path {
        self.manifest_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Resolve `--config-path` against `cwd`, defaulting to `./config.toml`.
#[must_use]
pub fn resolve_manifest_path(arg: Option<&Path>, cwd: &Path) -> PathBuf {
    cwd.join(arg.unwrap_or_else(|| Path::new(DEFAULT_MANIFEST)))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ManifestError;
    use crate::logging::BufferedLog;

    #[test]
    fn manifest_defaults_to_cwd_config() {
        assert_eq!(
            resolve_manifest_path(None, Path::new("/work")),
            PathBuf::from("/work/config.toml")
        );
    }

    #[test]
    fn relative_manifest_is_joined_to_cwd() {
        assert_eq!(
            resolve_manifest_path(Some(Path::new("conf/m.toml")), Path::new("/work")),
            PathBuf::from("/work/conf/m.toml")
        );
    }

    #[test]
    fn absolute_manifest_is_kept() {
        assert_eq!(
            resolve_manifest_path(Some(Path::new("/etc/m.toml")), Path::new("/work")),
            PathBuf::from("/etc/m.toml")
        );
    }

    #[test]
    fn init_loads_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[packages]\n[config_files]\n").unwrap();

        let setup = CommandSetup::init(&GlobalOpts::default(), dir.path(), &BufferedLog::new())
            .unwrap();

        assert_eq!(setup.manifest_dir(), dir.path());
        assert!(setup.manifest.config_files.is_empty());
    }

    #[test]
    fn init_fails_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandSetup::init(&GlobalOpts::default(), dir.path(), &BufferedLog::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::NotFound { .. })
        ));
    }
}
