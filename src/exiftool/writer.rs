use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::error::WriteError;
use super::{tag_name, Namespace};
use crate::mediavalet::{AssetMetadataTable, AttributeValues};

/// Settings shared by every per-file ExifTool invocation in a run.
#[derive(Debug, Clone)]
pub struct WriterSettings {
    pub exiftool: PathBuf,
    /// Absolute path of the generated config.
    pub config_path: PathBuf,
    pub namespace: Namespace,
    /// `None` waits for ExifTool indefinitely.
    pub timeout: Option<Duration>,
    pub dry_run: bool,
}

/// What happened to one local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    NoMetadata,
    DryRun,
}

/// A fully-built ExifTool command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    /// Space-joined command line for logs. Not shell-quoted.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Executes a built invocation. The production implementation spawns
/// ExifTool; tests substitute a recorder.
#[async_trait::async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), WriteError>;
}

/// Runs ExifTool as a child process, capturing its output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifToolRunner;

#[async_trait::async_trait]
impl ToolRunner for ExifToolRunner {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), WriteError> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WriteError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        // Dropping this future (timeout or cancel) kills the child.
        let wait = async move {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                    Ok(result) => result.map_err(WriteError::Wait),
                    Err(_) => Err(WriteError::Timeout {
                        secs: limit.as_secs(),
                    }),
                },
                None => child.wait_with_output().await.map_err(WriteError::Wait),
            }
        };

        let output = tokio::select! {
            result = wait => result?,
            _ = cancel.cancelled() => return Err(WriteError::Cancelled),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("exiftool: {}", stdout.trim());
        }

        if !output.status.success() {
            return Err(WriteError::Tool {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Text written into the XMP tag for an attribute value.
///
/// Strings are written verbatim and null as an empty string. Booleans are
/// `True`/`False`, and lists and objects use the `['a', 'b']` /
/// `{'k': 'v'}` notation existing libraries already carry in their files.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => literal(other),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quoted(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quoted(k), literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Single-quoted unless the text holds a single quote and no double quote.
fn quoted(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Build the ExifTool command for one file: config, in-place overwrite,
/// one `-XMP-<prefix>:<Tag>=<value>` per attribute, then the file.
pub fn build_invocation(
    file_path: &Path,
    values: &AttributeValues,
    settings: &WriterSettings,
) -> ToolInvocation {
    let group = settings.namespace.group();
    let mut args: Vec<OsString> = vec![
        "-config".into(),
        settings.config_path.clone().into_os_string(),
        "-overwrite_original".into(),
    ];
    for (name, value) in values {
        args.push(format!("-{}:{}={}", group, tag_name(name), format_value(value)).into());
    }
    args.push(file_path.as_os_str().to_owned());

    ToolInvocation {
        program: settings.exiftool.clone(),
        args,
    }
}

/// Write the metadata recorded for `file_path`'s base name into the file.
///
/// Files with no entry in the table are reported and skipped without
/// running ExifTool.
pub async fn write_metadata_to_file(
    file_path: &Path,
    table: &AssetMetadataTable,
    settings: &WriterSettings,
    runner: &dyn ToolRunner,
    cancel: &CancellationToken,
) -> Result<WriteOutcome, WriteError> {
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(values) = table.get(&file_name) else {
        tracing::info!("No metadata found for file: {}", file_name);
        return Ok(WriteOutcome::NoMetadata);
    };

    let invocation = build_invocation(file_path, values, settings);

    if settings.dry_run {
        tracing::info!("[dry run] Would execute: {}", invocation.display());
        return Ok(WriteOutcome::DryRun);
    }

    tracing::debug!("Executing command: {}", invocation.display());
    runner.run(&invocation, settings.timeout, cancel).await?;
    tracing::info!("Metadata written to {}", file_name);
    Ok(WriteOutcome::Written)
}
