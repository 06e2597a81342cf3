//! Interactive console prompts for values not supplied on the command line.
//!
//! Prompts block on stdin, so they run inside `block_in_place` to keep the
//! runtime's worker pool usable.

use std::io::{self, Write};

use anyhow::Context;

fn read_line(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn non_empty(value: String, what: &str) -> anyhow::Result<String> {
    if value.trim().is_empty() {
        anyhow::bail!("{} is required", what);
    }
    Ok(value)
}

/// Use `value` if present, otherwise ask for it on the console.
pub fn value_or_prompt(value: Option<String>, label: &str, what: &str) -> anyhow::Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => {
            let answer = tokio::task::block_in_place(|| read_line(label))
                .with_context(|| format!("Failed to read {what}"))?;
            non_empty(answer, what)
        }
    }
}

/// Like [`value_or_prompt`] but the typed answer is not echoed.
pub fn password_or_prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            let answer = tokio::task::block_in_place(|| rpassword::prompt_password(label))
                .context("Failed to read password")?;
            non_empty(answer, "Password")
        }
    }
}
