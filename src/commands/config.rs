//! The `config` subcommand: diff, install or update config files.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};

use super::CommandSetup;
use crate::cli::{ConfigMode, ConfigOpts, GlobalOpts};
use crate::config::{DEFAULT_CONFIGS_DIR, Manifest};
use crate::logging::{EntryStatus, Log, Logger};
use crate::resources::config_file::reconcile;
use crate::sync::{Confirm, ConfigSync, EntryOutcome, StdinConfirm};

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the manifest or backup directory is invalid, or if
/// any config file could not be processed.
pub fn run(global: &GlobalOpts, opts: &ConfigOpts, log: &Logger) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let setup = CommandSetup::init(global, &cwd, log)?;

    sync_configs(&setup, opts, &cwd, log, &StdinConfirm)?;
    finish(log)
}

/// Print the entry summary and fail if any entry was recorded as failed.
fn finish(log: &Logger) -> Result<()> {
    log.print_summary();

    let failures = log.failure_count();
    if failures > 0 {
        bail!("{failures} config file(s) failed");
    }
    Ok(())
}

/// Reconcile every manifest entry and apply the selected action.
///
/// Entries that cannot be reconciled are logged and reported as
/// [`EntryOutcome::Failed`] in manifest order alongside the others.
///
/// # Errors
///
/// Returns an error if the backup directory does not exist.
pub fn sync_configs(
    setup: &CommandSetup,
    opts: &ConfigOpts,
    cwd: &Path,
    log: &dyn Log,
    confirm: &dyn Confirm,
) -> Result<Vec<EntryOutcome>> {
    let backup_dir = resolve_configs_dir(
        opts.configs_dir.as_deref(),
        &setup.manifest,
        setup.manifest_dir(),
        cwd,
    )?;
    log.debug(&format!("configs dir: {}", backup_dir.display()));

    let mode = opts.action.mode();
    log.stage(match mode {
        ConfigMode::Diff | ConfigMode::DiffFile => "Comparing config files",
        ConfigMode::Install => "Installing config files",
        ConfigMode::Update => "Updating config files",
    });

    let entries = &setup.manifest.config_files;
    let mut results = Vec::with_capacity(entries.len());
    let mut failed = Vec::new();
    for (index, (entry, result)) in entries
        .iter()
        .zip(reconcile(&backup_dir, entries))
        .enumerate()
    {
        match result {
            Ok(result) => results.push(result),
            Err(e) => {
                let message = e.to_string();
                log.error(&format!("{}: {message}", entry.name));
                log.record_entry(&entry.name, EntryStatus::Failed, Some(&message));
                failed.push((index, EntryOutcome::Failed(message)));
            }
        }
    }

    let sync = ConfigSync::new(log, confirm, opts.dry_run);
    let mut outcomes = match mode {
        ConfigMode::Diff => sync.report(&results, false),
        ConfigMode::DiffFile => sync.report(&results, true),
        ConfigMode::Install => sync.install(&results),
        ConfigMode::Update => sync.update(&results),
    };
    for (index, outcome) in failed {
        outcomes.insert(index, outcome);
    }
    Ok(outcomes)
}

/// Resolve the backup directory.
///
/// `--configs-dir` is taken relative to `cwd`; the manifest's `configs_dir`
/// relative to the manifest's directory; otherwise `config_files` next to the
/// manifest is used.
///
/// # Errors
///
/// Returns an error if the resolved path is not a directory.
pub fn resolve_configs_dir(
    arg: Option<&Path>,
    manifest: &Manifest,
    manifest_dir: &Path,
    cwd: &Path,
) -> Result<PathBuf> {
    let dir = match (arg, manifest.configs_dir.as_deref()) {
        (Some(arg), _) => cwd.join(arg),
        (None, Some(configured)) => manifest_dir.join(configured),
        (None, None) => manifest_dir.join(DEFAULT_CONFIGS_DIR),
    };
    if !dir.is_dir() {
        bail!("Directory {} does not exist", dir.display());
    }
    Ok(dir)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cli::ConfigAction;
    use crate::config::toml_loader::parse_config;
    use crate::logging::{BufferedLog, Severity};

    fn manifest(content: &str) -> Manifest {
        Manifest::from_raw(parse_config(content).unwrap()).unwrap()
    }

    fn diff_opts() -> ConfigOpts {
        ConfigOpts {
            action: ConfigAction {
                diff: true,
                ..ConfigAction::default()
            },
            configs_dir: None,
            dry_run: false,
        }
    }

    #[test]
    fn cli_dir_wins_and_is_cwd_relative() {
        let cwd = tempfile::tempdir().unwrap();
        fs::create_dir(cwd.path().join("dots")).unwrap();
        let m = manifest("configs_dir = \"elsewhere\"\n[packages]\n[config_files]\n");

        let dir =
            resolve_configs_dir(Some(Path::new("dots")), &m, Path::new("/nowhere"), cwd.path())
                .unwrap();

        assert_eq!(dir, cwd.path().join("dots"));
    }

    #[test]
    fn manifest_dir_is_relative_to_manifest() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("saved")).unwrap();
        let m = manifest("configs_dir = \"saved\"\n[packages]\n[config_files]\n");

        let dir = resolve_configs_dir(None, &m, root.path(), Path::new("/nowhere")).unwrap();

        assert_eq!(dir, root.path().join("saved"));
    }

    #[test]
    fn default_dir_sits_next_to_manifest() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("config_files")).unwrap();
        let m = manifest("[packages]\n[config_files]\n");

        let dir = resolve_configs_dir(None, &m, root.path(), root.path()).unwrap();

        assert_eq!(dir, root.path().join("config_files"));
    }

    #[test]
    fn missing_dir_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let m = manifest("[packages]\n[config_files]\n");

        let err = resolve_configs_dir(None, &m, root.path(), root.path()).unwrap_err();

        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn failed_entry_fails_the_run() {
        let (log, _tmp, _guard) = crate::logging::isolated_logger();
        log.record_entry("rc", EntryStatus::Ok, None);
        log.record_entry("nvim", EntryStatus::Failed, Some("Permission denied"));

        let err = finish(&log).unwrap_err();

        assert_eq!(err.to_string(), "1 config file(s) failed");
    }

    #[test]
    fn skipped_entries_do_not_fail_the_run() {
        let (log, _tmp, _guard) = crate::logging::isolated_logger();
        log.record_entry("rc", EntryStatus::Skipped, Some("declined"));
        log.record_entry("zshrc", EntryStatus::Unchanged, None);

        assert!(finish(&log).is_ok());
    }

    #[test]
    fn reconcile_failures_keep_manifest_order() {
        let root = tempfile::tempdir().unwrap();
        let backup = root.path().join("config_files");
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join("plain"), "x").unwrap();
        let system = root.path().join("system");
        fs::create_dir(&system).unwrap();
        fs::write(system.join("plain"), "x").unwrap();
        // A path below a regular file cannot be inspected.
        let setup = CommandSetup {
            manifest_path: root.path().join("config.toml"),
            manifest: manifest(&format!(
                "[packages]\n[config_files]\nbroken = \"{0}/plain/child\"\nplain = \"{0}/plain\"\n",
                system.display()
            )),
        };
        let log = BufferedLog::new();

        let outcomes =
            sync_configs(&setup, &diff_opts(), root.path(), &log, &StdinConfirm).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], EntryOutcome::Failed(_)));
        assert_eq!(outcomes[1], EntryOutcome::Matched);
        assert_eq!(log.lines(Severity::Error).len(), 1);
        assert_eq!(log.records()[0].status, EntryStatus::Failed);
    }
}
