//! Child-process execution behind the [`Executor`] seam.
use anyhow::{Context, Result, bail};
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over spawning external programs.
///
/// The package-manager client talks to `pacman` exclusively through this
/// trait so its parsing logic can be tested with scripted output.
pub trait Executor: std::fmt::Debug {
    /// Run a command and capture its output. Fails if it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command and capture its output, allowing a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command attached to the user's terminal (inherited stdio).
    ///
    /// Used for commands that may prompt, such as `pacman -S`.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        let result = ExecResult::from(output);
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        if !status.success() {
            bail!("{program} failed (exit {})", status.code().unwrap_or(-1));
        }
        Ok(())
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Scripted [`Executor`] for unit tests.
///
/// Responses are consumed in FIFO order. When the queue is empty any call
/// returns a failed response (`success = false`, stdout = `"unexpected call"`).
/// Every invocation is recorded as a single `program arg1 arg2 …` string.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: std::sync::Mutex<std::collections::VecDeque<(bool, String)>>,
    calls: std::sync::Mutex<Vec<String>>,
    which_result: bool,
}

#[cfg(test)]
impl MockExecutor {
    /// Create a mock from an ordered list of `(success, stdout)` pairs.
    #[must_use]
    pub fn with_responses(responses: Vec<(bool, &str)>) -> Self {
        Self {
            responses: std::sync::Mutex::new(
                responses
                    .into_iter()
                    .map(|(ok, out)| (ok, out.to_string()))
                    .collect(),
            ),
            calls: std::sync::Mutex::new(Vec::new()),
            which_result: true,
        }
    }

    /// Set the value returned by every [`Executor::which`] call.
    #[must_use]
    pub const fn with_which(mut self, result: bool) -> Self {
        self.which_result = result;
        self
    }

    /// Return every recorded invocation.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    fn next(&self, program: &str, args: &[&str]) -> (bool, String) {
        if let Ok(mut calls) = self.calls.lock() {
            let mut line = program.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            calls.push(line);
        }
        self.responses.lock().map_or_else(
            |_| (false, "mutex poisoned".to_string()),
            |mut guard| {
                guard
                    .pop_front()
                    .unwrap_or_else(|| (false, "unexpected call".to_string()))
            },
        )
    }
}

#[cfg(test)]
impl Executor for MockExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let (success, stdout) = self.next(program, args);
        if !success {
            bail!("mock command failed: {program}");
        }
        Ok(ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(0),
        })
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let (success, stdout) = self.next(program, args);
        Ok(ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        })
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let (success, _) = self.next(program, args);
        if !success {
            bail!("mock command failed: {program}");
        }
        Ok(())
    }

    fn which(&self, _: &str) -> bool {
        self.which_result
    }
}
