//! mv-xmp-writer: copies MediaValet custom attributes into local files.
//!
//! Logs in with the OAuth password grant, reads the library's custom
//! attribute definitions and the assets of one category, then writes each
//! asset's attribute values into the matching local file as XMP tags in a
//! user-defined namespace, using ExifTool.

#![warn(clippy::all)]

mod auth;
mod cli;
mod config;
mod exiftool;
mod mediavalet;
mod prompt;
mod run;
mod shutdown;
mod types;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = config::Config::from_cli(cli)?;
    tracing::debug!(?config, "Starting mv-xmp-writer");

    // Ctrl+C keeps its default behaviour during the prompts and fetches.
    let prepared = run::prepare(&config).await?;

    let shutdown_token = shutdown::install_signal_handler();
    let runner = exiftool::writer::ExifToolRunner;

    let summary = prepared.execute(&runner, &shutdown_token).await?;

    tracing::info!(
        attributes = summary.attributes,
        assets = summary.assets,
        written = summary.folder.written,
        skipped = summary.folder.skipped,
        dry_run = summary.folder.dry_run,
        failed = summary.folder.failed,
        "Run complete"
    );

    summary.ensure_complete()
}
