use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use super::error::FolderError;
use super::writer::{write_metadata_to_file, ToolRunner, WriteOutcome, WriterSettings};
use crate::mediavalet::AssetMetadataTable;

/// Per-folder tally of writer outcomes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub written: usize,
    pub skipped: usize,
    pub dry_run: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Strip whitespace and the quotes a shell or file manager adds around a
/// pasted path.
pub fn clean_folder_input(raw: &str) -> String {
    raw.trim().trim_matches('"').trim_matches('\'').to_string()
}

/// Regular files directly inside `folder`, in the order the filesystem
/// lists them. Subdirectories are ignored; symlinks to files are followed.
pub fn list_files(folder: &Path) -> Result<Vec<PathBuf>, FolderError> {
    if !folder.is_dir() {
        return Err(FolderError::NotADirectory(folder.to_path_buf()));
    }
    let read_err = |source| FolderError::Read {
        path: folder.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Returns `ProgressBar::hidden()` when disabled or stdout is not a TTY.
fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

/// Write metadata into every regular file of `folder`.
///
/// Failures are logged and counted per file; only cancellation stops the
/// loop early. The file list is taken once up front.
pub async fn process_folder(
    folder: &Path,
    table: &AssetMetadataTable,
    settings: &WriterSettings,
    runner: &dyn ToolRunner,
    no_progress_bar: bool,
    cancel: &CancellationToken,
) -> Result<FolderSummary, FolderError> {
    let files = list_files(folder)?;
    tracing::info!("Found {} files in {}", files.len(), folder.display());

    let pb = create_progress_bar(no_progress_bar, files.len() as u64);
    let mut summary = FolderSummary::default();

    for path in &files {
        if cancel.is_cancelled() {
            pb.suspend(|| tracing::info!("Shutdown requested, stopping before next file"));
            summary.cancelled = true;
            break;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(file_name.clone());

        pb.suspend(|| tracing::info!("Processing file: {}", file_name));

        match write_metadata_to_file(path, table, settings, runner, cancel).await {
            Ok(WriteOutcome::Written) => summary.written += 1,
            Ok(WriteOutcome::NoMetadata) => summary.skipped += 1,
            Ok(WriteOutcome::DryRun) => summary.dry_run += 1,
            Err(e) if e.stops_run() => {
                pb.suspend(|| tracing::warn!("Stopped while writing {}: {}", file_name, e));
                summary.cancelled = true;
                break;
            }
            Err(e) => {
                pb.suspend(|| {
                    tracing::error!("Failed to write metadata to {}. Error: {}", file_name, e)
                });
                summary.failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    if !summary.cancelled {
        tracing::info!(
            written = summary.written,
            skipped = summary.skipped,
            failed = summary.failed,
            "All files in the folder have been processed."
        );
    }
    Ok(summary)
}
