use std::path::PathBuf;

use thiserror::Error;

/// Errors generating the ExifTool configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Attributes '{first}' and '{second}' both map to XMP tag '{tag}'")]
    TagCollision {
        tag: String,
        first: String,
        second: String,
    },

    #[error("Attribute name '{0}' produces an empty XMP tag")]
    EmptyTag(String),

    #[error("Invalid XMP namespace: {0}")]
    InvalidNamespace(String),

    #[error("Failed to write ExifTool config to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-file failures of the metadata writer. None of these stop the
/// folder loop except [`WriteError::Cancelled`].
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed waiting for ExifTool: {0}")]
    Wait(#[source] std::io::Error),

    #[error("ExifTool error (exit code {code:?}): {stderr}")]
    Tool { code: Option<i32>, stderr: String },

    #[error("ExifTool did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("Cancelled before ExifTool finished")]
    Cancelled,
}

impl WriteError {
    /// Whether the run should stop processing further files.
    pub fn stops_run(&self) -> bool {
        matches!(self, WriteError::Cancelled)
    }
}

/// Errors preparing the folder walk.
#[derive(Debug, Error)]
pub enum FolderError {
    #[error("The folder '{}' does not exist", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
