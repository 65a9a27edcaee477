//! Confirmation prompts.

use anyhow::{Context, Result};

use super::RealRuntime;

use std::io::{self, BufRead, Write};

/// Write `prompt` to `output` and read one answer line from `input`.
/// Only `y` and `yes` (any case) confirm; end of input declines.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    if input
        .read_line(&mut answer)
        .context("Failed to read answer")?
        == 0
    {
        return Ok(false);
    }
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        confirm_with_io(prompt, &mut io::stdin().lock(), &mut io::stdout())
    }
}
