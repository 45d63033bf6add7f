//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Arch Linux package and dotfile management utility.
#[derive(Parser, Debug)]
#[command(
    name = "archutil",
    about = "Arch Linux package and config file management utility",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to the manifest (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config_path: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install package categories from the manifest
    Install(InstallOpts),
    /// List installed packages missing from the manifest
    List(ListOpts),
    /// Diff, install or update config files
    Config(ConfigOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::List(_) => "list",
            Self::Config(_) => "config",
            Self::Version => "version",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Categories to install (default: all)
    #[arg(long, num_args = 1..)]
    pub categories: Vec<String>,

    /// Pass --noconfirm to the package manager
    #[arg(long)]
    pub noconfirm: bool,

    /// Check everything but install nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// Options for the `list` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ListOpts {
    /// List packages in the manifest that are not installed instead
    #[arg(short, long)]
    pub inverse: bool,
}

/// Options for the `config` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ConfigOpts {
    /// What to do with the config files.
    #[command(flatten)]
    pub action: ConfigAction,

    /// Backup directory (absolute or relative to the current directory)
    #[arg(long)]
    pub configs_dir: Option<PathBuf>,

    /// Show the copies that would be made without making them
    #[arg(long)]
    pub dry_run: bool,
}

/// Mutually exclusive `config` actions; exactly one is required.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = true, multiple = false)]
pub struct ConfigAction {
    /// List which config files differ
    #[arg(short = 'd', long)]
    pub diff: bool,

    /// Show the differences between config files
    #[arg(short = 'D', long)]
    pub diff_file: bool,

    /// Copy backups onto the system
    #[arg(short, long)]
    pub install: bool,

    /// Copy system files into the backup directory
    #[arg(short, long)]
    pub update: bool,
}

/// The selected [`ConfigAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Report which files differ.
    Diff,
    /// Report which files differ, with their diffs.
    DiffFile,
    /// Copy backup to system.
    Install,
    /// Copy system to backup.
    Update,
}

impl ConfigAction {
    /// The single selected mode.
    #[must_use]
    pub const fn mode(&self) -> ConfigMode {
        if self.install {
            ConfigMode::Install
        } else if self.update {
            ConfigMode::Update
        } else if self.diff_file {
            ConfigMode::DiffFile
        } else {
            ConfigMode::Diff
        }
    }
}
