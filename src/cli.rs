use std::path::PathBuf;

use clap::Parser;

use crate::types::LogLevel;

/// Values left unset here fall back to the settings file, then to the
/// built-in defaults. Username, password, category and folder are prompted
/// for when still missing.
#[derive(Parser, Debug)]
#[command(
    name = "mv-xmp-writer",
    version,
    about = "Write MediaValet custom attributes into local files as XMP metadata"
)]
pub struct Cli {
    /// MediaValet username
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// MediaValet password (if not provided, will prompt).
    /// WARNING: passing via --password is visible in process listings.
    /// Prefer the MV_PASSWORD environment variable instead.
    #[arg(short = 'p', long, env = "MV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Category ID; assets in the category and its subcategories are used
    #[arg(short = 'c', long)]
    pub category: Option<String>,

    /// Local folder whose files receive the metadata
    #[arg(short = 'd', long)]
    pub directory: Option<String>,

    /// TOML settings file (default: ~/.mv-xmp-writer.toml when present)
    #[arg(long)]
    pub settings: Option<String>,

    /// API client id
    #[arg(long, env = "MV_CLIENT_ID")]
    pub client_id: Option<String>,

    /// API client secret
    #[arg(long, env = "MV_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// APIM subscription key
    #[arg(long, env = "MV_SUBSCRIPTION_KEY", hide_env_values = true)]
    pub subscription_key: Option<String>,

    /// Path to the exiftool executable
    #[arg(long)]
    pub exiftool: Option<PathBuf>,

    /// Where to write the generated ExifTool config
    #[arg(long)]
    pub exiftool_config: Option<PathBuf>,

    /// XMP namespace prefix for the written tags
    #[arg(long)]
    pub namespace_prefix: Option<String>,

    /// XMP namespace URI
    #[arg(long)]
    pub namespace_uri: Option<String>,

    /// Base URL of the login service
    #[arg(long)]
    pub auth_base: Option<String>,

    /// Base URL of the API
    #[arg(long)]
    pub api_base: Option<String>,

    /// HTTP request timeout in seconds (0 = wait indefinitely)
    #[arg(long)]
    pub http_timeout: Option<u64>,

    /// Per-file exiftool timeout in seconds (0 = wait indefinitely)
    #[arg(long)]
    pub tool_timeout: Option<u64>,

    /// Log the exiftool commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
