//! Shared helpers for integration tests.
//!
//! Provides a temporary-directory-backed environment with a manifest, a
//! backup directory and a fake "system" tree, plus a scripted confirmation
//! provider, so each integration test can run the config workflows without
//! touching the real home directory.
//!
//! Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used)]

use std::cell::RefCell;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use archutil::cli::{ConfigAction, ConfigOpts, GlobalOpts};
use archutil::commands::CommandSetup;
use archutil::commands::config::sync_configs;
use archutil::logging::{BufferedLog, Severity};
use archutil::sync::confirm::{Confirm, ask};
use archutil::sync::EntryOutcome;

/// An isolated environment backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `config.toml`    the manifest
/// - `config_files/`  the backup directory
/// - `system/`        stands in for the live filesystem
pub struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    /// Root of the environment.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// The backup directory.
    pub fn backup_dir(&self) -> PathBuf {
        self.root().join("config_files")
    }

    /// Live location of config `name`.
    pub fn system_path(&self, name: &str) -> PathBuf {
        self.root().join("system").join(name)
    }

    /// Backup location of config `name`.
    pub fn backup_path(&self, name: &str) -> PathBuf {
        self.backup_dir().join(name)
    }

    /// Read a file relative to the root, `None` if it does not exist.
    pub fn read(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.root().join(relative)).ok()
    }

    /// Whether anything exists at `relative` (dangling links included).
    pub fn exists(&self, relative: &str) -> bool {
        fs::symlink_metadata(self.root().join(relative)).is_ok()
    }

    /// Load the manifest the way the CLI does.
    pub fn setup(&self) -> CommandSetup {
        let global = GlobalOpts {
            config_path: Some(self.root().join("config.toml")),
        };
        CommandSetup::init(&global, self.root(), &BufferedLog::new()).expect("load manifest")
    }

    /// Run one `config` action and return the outcomes.
    pub fn run(
        &self,
        action: ConfigAction,
        dry_run: bool,
        log: &BufferedLog,
        confirm: &dyn Confirm,
    ) -> Vec<EntryOutcome> {
        let opts = ConfigOpts {
            action,
            configs_dir: None,
            dry_run,
        };
        sync_configs(&self.setup(), &opts, self.root(), log, confirm).expect("config run")
    }

    /// Render every non-debug message with the root path redacted.
    pub fn transcript(&self, log: &BufferedLog) -> String {
        let root = self.root().display().to_string();
        log.messages()
            .iter()
            .filter(|e| e.severity != Severity::Debug)
            .map(|e| format!("{:?}: {}", e.severity, e.message.replace(&root, "[ROOT]")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The `-d` action.
pub fn diff() -> ConfigAction {
    ConfigAction {
        diff: true,
        ..ConfigAction::default()
    }
}

/// The `-D` action.
pub fn diff_file() -> ConfigAction {
    ConfigAction {
        diff_file: true,
        ..ConfigAction::default()
    }
}

/// The `-i` action.
pub fn install() -> ConfigAction {
    ConfigAction {
        install: true,
        ..ConfigAction::default()
    }
}

/// The `-u` action.
pub fn update() -> ConfigAction {
    ConfigAction {
        update: true,
        ..ConfigAction::default()
    }
}

/// Fluent builder for [`TestEnv`].
pub struct TestEnvBuilder {
    env: TestEnv,
    entries: Vec<String>,
}

impl TestEnvBuilder {
    /// Begin building an environment with empty backup and system trees.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        fs::create_dir(root.path().join("config_files")).expect("create backup dir");
        fs::create_dir(root.path().join("system")).expect("create system dir");
        Self {
            env: TestEnv { root },
            entries: Vec::new(),
        }
    }

    /// Declare config `name` in the manifest.
    pub fn with_entry(mut self, name: &str) -> Self {
        self.entries.push(name.to_string());
        self
    }

    /// Write the backup copy of `name`.
    pub fn with_backup(self, name: &str, content: &str) -> Self {
        write(&self.env.backup_path(name), content);
        self
    }

    /// Write the system copy of `name`.
    pub fn with_system(self, name: &str, content: &str) -> Self {
        write(&self.env.system_path(name), content);
        self
    }

    /// Write the manifest and return the environment.
    pub fn build(self) -> TestEnv {
        let mut manifest = String::from("[packages]\nbase = [\"git\"]\n\n[config_files]\n");
        for name in &self.entries {
            manifest.push_str(&format!(
                "\"{name}\" = \"{}\"\n",
                self.env.system_path(name).display()
            ));
        }
        fs::write(self.env.root().join("config.toml"), manifest).expect("write manifest");
        self.env
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, content).expect("write file");
}

/// [`Confirm`] that answers from pre-recorded input lines.
///
/// Answers go through the same parser as the terminal prompt, so unknown
/// input re-prompts and running out of input declines.
#[derive(Debug)]
pub struct ScriptedConfirm {
    input: RefCell<Cursor<Vec<u8>>>,
    transcript: RefCell<Vec<u8>>,
}

impl ScriptedConfirm {
    /// Answer with `lines`, one per prompt read.
    pub fn answering(lines: &[&str]) -> Self {
        let mut input = lines.join("\n");
        if !lines.is_empty() {
            input.push('\n');
        }
        Self {
            input: RefCell::new(Cursor::new(input.into_bytes())),
            transcript: RefCell::new(Vec::new()),
        }
    }

    /// Everything written to the simulated terminal.
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.transcript.borrow()).into_owned()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str, default_yes: bool) -> io::Result<bool> {
        let mut input = self.input.borrow_mut();
        let mut output = self.transcript.borrow_mut();
        ask(&mut *input, &mut *output, prompt, default_yes)
    }
}
