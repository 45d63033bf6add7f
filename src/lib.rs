//! Arch Linux package and dotfile management.
//!
//! Keeps a machine in line with a TOML manifest: which packages should be
//! installed, and which config files are backed up where.
//!
//! - **[`config`]**: load and validate the manifest
//! - **[`resources`]**: safe copies, backup/system reconciliation, the pacman client
//! - **[`sync`]**: report, install and update workflows for config files
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `list`, `config`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod resources;
pub mod sync;
