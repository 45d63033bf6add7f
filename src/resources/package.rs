//! Package-manager client for `pacman` and pacman-compatible AUR helpers.
use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;

use crate::error::PackageError;
use crate::exec::Executor;

/// Client for a pacman-compatible executable.
///
/// All process spawning goes through the injected [`Executor`].
#[derive(Debug)]
pub struct Pacman<'a> {
    program: String,
    executor: &'a dyn Executor,
}

impl<'a> Pacman<'a> {
    /// Create a client for `program` (e.g. `pacman` or `paru`).
    #[must_use]
    pub fn new(program: impl Into<String>, executor: &'a dyn Executor) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    /// The executable this client invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the executable is pacman itself rather than a helper.
    ///
    /// Only pacman needs `sudo`; AUR helpers escalate on their own.
    #[must_use]
    pub fn is_pacman(&self) -> bool {
        Path::new(&self.program)
            .file_name()
            .is_some_and(|name| name == "pacman")
    }

    /// Fail early when the executable is not on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::ManagerNotFound`] if the lookup fails.
    pub fn ensure_available(&self) -> Result<(), PackageError> {
        if self.executor.which(&self.program) {
            Ok(())
        } else {
            Err(PackageError::ManagerNotFound(self.program.clone()))
        }
    }

    /// Explicitly installed packages, excluding members of `excluded_groups`.
    ///
    /// # Errors
    ///
    /// Returns an error if `-Qe` cannot be run or fails.
    pub fn explicitly_installed(&self, excluded_groups: &[String]) -> Result<BTreeSet<String>> {
        let installed = self.executor.run(&self.program, &["-Qe"])?;
        let mut names: BTreeSet<String> = first_tokens(&installed.stdout).collect();

        if !excluded_groups.is_empty() {
            let mut args = vec!["-Qg"];
            args.extend(excluded_groups.iter().map(String::as_str));
            // Non-zero when one of the groups has no installed members.
            let members = self.executor.run_unchecked(&self.program, &args)?;
            for line in members.stdout.lines() {
                if let Some(member) = line.split_whitespace().nth(1) {
                    names.remove(member);
                }
            }
        }
        Ok(names)
    }

    /// The subset of `names` that are package groups in the sync databases.
    ///
    /// # Errors
    ///
    /// Returns an error if `-Sg` cannot be spawned.
    pub fn groups_among(&self, names: &[String]) -> Result<BTreeSet<String>> {
        if names.is_empty() {
            return Ok(BTreeSet::new());
        }
        let mut args = vec!["-Sg"];
        args.extend(names.iter().map(String::as_str));
        let result = self.executor.run_unchecked(&self.program, &args)?;
        Ok(first_tokens(&result.stdout).collect())
    }

    /// Names from `names` that no configured repository provides, sorted.
    ///
    /// Names absent from `-Ssq` are re-checked one by one when the executable
    /// is an AUR helper, since those also search the AUR.
    ///
    /// # Errors
    ///
    /// Returns an error if the package listing cannot be obtained.
    pub fn missing_packages(&self, names: &[String]) -> Result<Vec<String>> {
        let available = self.executor.run(&self.program, &["-Ssq"])?;
        let available: BTreeSet<&str> = available.stdout.lines().map(str::trim).collect();

        let mut missing: BTreeSet<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| !available.contains(name))
            .collect();

        if !self.is_pacman() {
            let mut still_missing = BTreeSet::new();
            for name in missing {
                let result = self.executor.run_unchecked(&self.program, &["-Ssq", name])?;
                if !(result.success && result.stdout.lines().any(|l| l.trim() == name)) {
                    still_missing.insert(name);
                }
            }
            missing = still_missing;
        }

        Ok(missing.into_iter().map(String::from).collect())
    }

    /// Refresh the sync databases (`-Sy`). Returns whether it succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned.
    pub fn refresh_databases(&self) -> Result<bool> {
        let (program, args) = self.privileged(&["-Sy"]);
        Ok(self.executor.run_unchecked(program, &args)?.success)
    }

    /// Install `names` with `-S --needed`, attached to the terminal so the
    /// package manager can prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager exits non-zero.
    pub fn install(&self, names: &[String], noconfirm: bool) -> Result<()> {
        let mut base = vec!["-S", "--needed"];
        if noconfirm {
            base.push("--noconfirm");
        }
        base.extend(names.iter().map(String::as_str));
        let (program, args) = self.privileged(&base);
        self.executor.run_interactive(program, &args)
    }

    /// Prefix `args` with the executable under `sudo` when it is pacman.
    fn privileged<'s>(&'s self, args: &[&'s str]) -> (&'s str, Vec<&'s str>) {
        if self.is_pacman() {
            let mut full = vec![self.program.as_str()];
            full.extend_from_slice(args);
            ("sudo", full)
        } else {
            (self.program.as_str(), args.to_vec())
        }
    }
}

fn first_tokens(stdout: &str) -> impl Iterator<Item = String> + '_ {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(String::from)
}

/// Repositories from `required` with no `[name]` section in `pacman_conf`.
///
/// Commented-out sections (`#[multilib]`) do not count as enabled.
#[must_use]
pub fn missing_repos(pacman_conf: &str, required: &[String]) -> Vec<String> {
    let sections: BTreeSet<&str> = pacman_conf
        .lines()
        .filter_map(|line| line.trim().strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .collect();
    required
        .iter()
        .filter(|repo| !sections.contains(repo.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::MockExecutor;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn is_pacman_checks_file_name() {
        let executor = MockExecutor::with_responses(vec![]);
        assert!(Pacman::new("pacman", &executor).is_pacman());
        assert!(Pacman::new("/usr/bin/pacman", &executor).is_pacman());
        assert!(!Pacman::new("paru", &executor).is_pacman());
    }

    #[test]
    fn ensure_available_looks_up_program() {
        let present = MockExecutor::with_responses(vec![]);
        assert!(Pacman::new("paru", &present).ensure_available().is_ok());

        let absent = MockExecutor::with_responses(vec![]).with_which(false);
        let err = Pacman::new("paru", &absent).ensure_available().unwrap_err();
        assert!(matches!(err, PackageError::ManagerNotFound(name) if name == "paru"));
    }

    #[test]
    fn explicitly_installed_excludes_group_members() {
        let executor = MockExecutor::with_responses(vec![
            (true, "git 2.44-1\nvim 9.1-1\nbash 5.2-1\n"),
            (true, "base bash\nbase coreutils\n"),
        ]);
        let pacman = Pacman::new("pacman", &executor);

        let installed = pacman.explicitly_installed(&names(&["base"])).unwrap();

        assert_eq!(installed.into_iter().collect::<Vec<_>>(), vec!["git", "vim"]);
        assert_eq!(executor.calls(), vec!["pacman -Qe", "pacman -Qg base"]);
    }

    #[test]
    fn explicitly_installed_without_groups_runs_once() {
        let executor = MockExecutor::with_responses(vec![(true, "git 2.44-1\n")]);
        let installed = Pacman::new("pacman", &executor)
            .explicitly_installed(&[])
            .unwrap();
        assert!(installed.contains("git"));
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn groups_among_collects_group_names() {
        let executor =
            MockExecutor::with_responses(vec![(true, "xorg xorg-server\nxorg xorg-xinit\n")]);
        let groups = Pacman::new("pacman", &executor)
            .groups_among(&names(&["xorg", "git"]))
            .unwrap();
        assert_eq!(groups.into_iter().collect::<Vec<_>>(), vec!["xorg"]);
        assert_eq!(executor.calls(), vec!["pacman -Sg xorg git"]);
    }

    #[test]
    fn groups_among_empty_input_skips_query() {
        let executor = MockExecutor::with_responses(vec![]);
        let groups = Pacman::new("pacman", &executor).groups_among(&[]).unwrap();
        assert!(groups.is_empty());
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn missing_packages_with_pacman() {
        let executor = MockExecutor::with_responses(vec![(true, "git\nvim\n")]);
        let missing = Pacman::new("pacman", &executor)
            .missing_packages(&names(&["vim", "nope", "git"]))
            .unwrap();
        assert_eq!(missing, vec!["nope"]);
    }

    #[test]
    fn missing_packages_rechecks_with_helper() {
        let executor = MockExecutor::with_responses(vec![
            (true, "git\n"),
            (true, "spotify\nspotify-tui\n"),
            (false, ""),
        ]);
        let missing = Pacman::new("paru", &executor)
            .missing_packages(&names(&["spotify", "git", "zzz"]))
            .unwrap();
        assert_eq!(missing, vec!["zzz"]);
        assert_eq!(
            executor.calls(),
            vec!["paru -Ssq", "paru -Ssq spotify", "paru -Ssq zzz"]
        );
    }

    #[test]
    fn helper_recheck_requires_exact_match() {
        let executor =
            MockExecutor::with_responses(vec![(true, ""), (true, "spotify-tui\n")]);
        let missing = Pacman::new("paru", &executor)
            .missing_packages(&names(&["spotify"]))
            .unwrap();
        assert_eq!(missing, vec!["spotify"]);
    }

    #[test]
    fn refresh_uses_sudo_for_pacman() {
        let executor = MockExecutor::with_responses(vec![(true, "")]);
        assert!(Pacman::new("pacman", &executor).refresh_databases().unwrap());
        assert_eq!(executor.calls(), vec!["sudo pacman -Sy"]);
    }

    #[test]
    fn refresh_reports_failure() {
        let executor = MockExecutor::with_responses(vec![(false, "")]);
        assert!(!Pacman::new("paru", &executor).refresh_databases().unwrap());
        assert_eq!(executor.calls(), vec!["paru -Sy"]);
    }

    #[test]
    fn install_builds_command() {
        let executor = MockExecutor::with_responses(vec![(true, ""), (true, "")]);
        let pacman = Pacman::new("pacman", &executor);
        pacman.install(&names(&["git", "vim"]), false).unwrap();
        Pacman::new("paru", &executor)
            .install(&names(&["spotify"]), true)
            .unwrap();
        assert_eq!(
            executor.calls(),
            vec![
                "sudo pacman -S --needed git vim",
                "paru -S --needed --noconfirm spotify"
            ]
        );
    }

    #[test]
    fn install_propagates_failure() {
        let executor = MockExecutor::with_responses(vec![(false, "")]);
        assert!(
            Pacman::new("pacman", &executor)
                .install(&names(&["git"]), true)
                .is_err()
        );
    }

    #[test]
    fn missing_repos_ignores_commented_sections() {
        let conf = "[options]\nHoldPkg = pacman\n\n#[multilib]\n#Include = x\n\n[community]\n";
        assert_eq!(
            missing_repos(conf, &names(&["community", "multilib"])),
            vec!["multilib"]
        );
    }

    #[test]
    fn missing_repos_empty_when_all_enabled() {
        let conf = "[core]\n[extra]\n";
        assert!(missing_repos(conf, &names(&["core", "extra"])).is_empty());
    }
}
