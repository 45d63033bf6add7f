//! Yes/no confirmation for destructive updates.
use std::fmt::Debug;
use std::io::{self, BufRead, Write};

/// Source of yes/no answers.
///
/// Production code reads the terminal with [`StdinConfirm`]; tests inject
/// scripted answers.
pub trait Confirm: Debug {
    /// Ask `prompt` and return the user's answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or the answer read.
    fn confirm(&self, prompt: &str, default_yes: bool) -> io::Result<bool>;
}

/// Interactive [`Confirm`] on stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str, default_yes: bool) -> io::Result<bool> {
        ask(io::stdin().lock(), io::stdout().lock(), prompt, default_yes)
    }
}

/// Interpret one line of input. `None` means the answer was not understood.
#[must_use]
pub fn parse_answer(input: &str, default_yes: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default_yes),
        "yes" | "y" | "ye" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

/// Prompt on `output` until `input` yields a recognizable answer.
///
/// End of input counts as declining.
///
/// # Errors
///
/// Returns an error if writing the prompt or reading the answer fails.
pub fn ask<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    prompt: &str,
    default_yes: bool,
) -> io::Result<bool> {
    loop {
        write!(output, "{prompt}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }
        if let Some(answer) = parse_answer(&line, default_yes) {
            return Ok(answer);
        }
        writeln!(output, "\x1b[33mPlease respond with 'y' or 'n'\x1b[0m")?;
    }
}
