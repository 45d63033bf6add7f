//! The `install` subcommand: install package categories.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::{Manifest, PackageCategory};
use crate::error::PackageError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::resources::package::{Pacman, missing_repos};

/// Location of the pacman configuration checked for required repositories.
pub const PACMAN_CONF: &str = "/etc/pacman.conf";

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the manifest is invalid or any precondition for the
/// installation fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let setup = CommandSetup::init(global, &cwd, log)?;
    install_packages(
        &setup.manifest,
        opts,
        &SystemExecutor,
        Path::new(PACMAN_CONF),
        log,
    )
}

/// Check preconditions and install the selected categories.
///
/// Nothing is installed unless every requested category exists, the
/// package manager is on `PATH`, every required repository is enabled, the
/// databases refresh, and every package can be found. With `dry_run` the
/// refresh and install are only reported.
///
/// # Errors
///
/// Returns a [`PackageError`] for a failed precondition, or the package
/// manager's error if the installation itself fails.
pub fn install_packages(
    manifest: &Manifest,
    opts: &InstallOpts,
    executor: &dyn Executor,
    pacman_conf: &Path,
    log: &dyn Log,
) -> Result<()> {
    let categories = select_categories(manifest, &opts.categories)?;
    let packages = package_list(&categories);
    let pacman = Pacman::new(manifest.pacman_program(), executor);
    pacman.ensure_available()?;

    if !manifest.required_repos.is_empty() {
        log.stage("Checking repositories");
        let conf = std::fs::read_to_string(pacman_conf)
            .with_context(|| format!("reading {}", pacman_conf.display()))?;
        let missing = missing_repos(&conf, &manifest.required_repos);
        if !missing.is_empty() {
            return Err(PackageError::MissingRepos(missing).into());
        }
    }

    log.stage("Updating package database");
    if opts.dry_run {
        log.dry_run(&format!("Would refresh databases with {}", pacman.program()));
    } else {
        log.info("enter sudo password if prompted");
        if !pacman.refresh_databases()? {
            return Err(PackageError::RefreshFailed.into());
        }
        log.info("Update successful");
    }

    log.stage("Checking that all packages exist");
    let missing = pacman.missing_packages(&packages)?;
    if !missing.is_empty() {
        return Err(PackageError::UnknownPackages(missing).into());
    }

    log.stage("Installing packages");
    for category in &categories {
        log.debug(&format!("{}: {}", category.name, category.packages.join(" ")));
    }
    if opts.dry_run {
        log.dry_run(&format!(
            "Would install {} packages: {}",
            packages.len(),
            packages.join(" ")
        ));
        return Ok(());
    }
    pacman.install(&packages, opts.noconfirm)?;
    log.info("Install complete");
    Ok(())
}

/// The requested categories in request order, or every category when none
/// are named.
///
/// # Errors
///
/// Returns [`PackageError::UnknownCategory`] for the first name the manifest
/// does not declare.
pub fn select_categories<'m>(
    manifest: &'m Manifest,
    requested: &[String],
) -> Result<Vec<&'m PackageCategory>, PackageError> {
    if requested.is_empty() {
        return Ok(manifest.packages.iter().collect());
    }
    requested
        .iter()
        .map(|name| {
            manifest
                .category(name)
                .ok_or_else(|| PackageError::UnknownCategory(name.clone()))
        })
        .collect()
}

/// Flatten categories into one package list, keeping the first occurrence.
fn package_list(categories: &[&PackageCategory]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    categories
        .iter()
        .flat_map(|c| c.packages.iter().map(String::as_str))
        .filter(|p| seen.insert(*p))
        .map(String::from)
        .collect()
}
