//! The `list` subcommand: package drift between the system and the manifest.
use std::collections::BTreeSet;
use std::io::Write as _;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, ListOpts};
use crate::config::Manifest;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Logger;
use crate::resources::package::Pacman;

/// Group whose members always count as listed.
const BASE_GROUP: &str = "base";

/// Run the list command, printing one package per line.
///
/// # Errors
///
/// Returns an error if the manifest is invalid or the package manager
/// cannot be queried.
pub fn run(global: &GlobalOpts, opts: &ListOpts, log: &Logger) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let setup = CommandSetup::init(global, &cwd, log)?;
    let packages = unlisted_packages(&setup.manifest, opts.inverse, &SystemExecutor)?;

    let mut stdout = std::io::stdout().lock();
    for package in packages {
        writeln!(stdout, "{package}").context("writing package list")?;
    }
    Ok(())
}

/// Sorted package drift.
///
/// Without `inverse`: explicitly installed packages the manifest does not
/// list, where members of listed groups and of `base` count as listed.
/// With `inverse`: listed packages that are not installed; listed group
/// names are not packages and are left out.
///
/// # Errors
///
/// Returns an error if the package manager is not on `PATH` or cannot be
/// queried.
pub fn unlisted_packages(
    manifest: &Manifest,
    inverse: bool,
    executor: &dyn Executor,
) -> Result<Vec<String>> {
    let pacman = Pacman::new(manifest.pacman_program(), executor);
    pacman.ensure_available()?;
    let listed = manifest.listed_packages();
    let listed_names: Vec<String> = listed.iter().cloned().collect();

    let groups = pacman.groups_among(&listed_names)?;
    let mut excluded: Vec<String> = groups.iter().cloned().collect();
    if !groups.contains(BASE_GROUP) {
        excluded.push(BASE_GROUP.to_string());
    }
    let installed = pacman.explicitly_installed(&excluded)?;

    let drift: BTreeSet<&String> = if inverse {
        listed
            .iter()
            .filter(|p| !installed.contains(*p) && !groups.contains(*p))
            .collect()
    } else {
        installed.difference(&listed).collect()
    };
    Ok(drift.into_iter().cloned().collect())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::toml_loader::parse_config;
    use crate::exec::MockExecutor;

    fn manifest() -> Manifest {
        let content = "[packages]\nbase = [\"git\", \"vim\", \"xorg\"]\n[config_files]\n";
        Manifest::from_raw(parse_config(content).unwrap()).unwrap()
    }

    fn executor() -> MockExecutor {
        MockExecutor::with_responses(vec![
            (true, "xorg xorg-server\nxorg xorg-xinit\n"),
            (true, "git 1\nhtop 1\nzsh 1\n"),
            (true, ""),
        ])
    }

    #[test]
    fn lists_installed_but_unlisted() {
        let executor = executor();

        let drift = unlisted_packages(&manifest(), false, &executor).unwrap();

        assert_eq!(drift, vec!["htop", "zsh"]);
        assert_eq!(
            executor.calls(),
            vec!["pacman -Sg git vim xorg", "pacman -Qe", "pacman -Qg xorg base"]
        );
    }

    #[test]
    fn inverse_lists_listed_but_missing() {
        let drift = unlisted_packages(&manifest(), true, &executor()).unwrap();
        assert_eq!(drift, vec!["vim"]);
    }

    #[test]
    fn group_members_count_as_listed() {
        let executor = MockExecutor::with_responses(vec![
            (true, "xorg xorg-server\n"),
            (true, "git 1\nxorg-server 1\nlinux 1\n"),
            (true, "xorg xorg-server\nbase linux\n"),
        ]);

        let drift = unlisted_packages(&manifest(), false, &executor).unwrap();

        assert!(drift.is_empty());
    }
}
