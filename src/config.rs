use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::auth::endpoints::{Endpoints, DEFAULT_API_BASE, DEFAULT_AUTH_BASE};
use crate::auth::ClientCredentials;
use crate::exiftool::config::DEFAULT_CONFIG_FILE;
use crate::exiftool::{Namespace, DEFAULT_NAMESPACE_PREFIX, DEFAULT_NAMESPACE_URI};

/// Settings file looked up in the home directory when `--settings` is not
/// given.
const DEFAULT_SETTINGS_FILE: &str = "~/.mv-xmp-writer.toml";
const DEFAULT_EXIFTOOL: &str = "exiftool";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing required setting '{0}' (flag, environment variable or settings file)")]
    Missing(&'static str),
}

/// Contents of the TOML settings file. Every key is optional; CLI flags
/// and environment variables override what is set here.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub username: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_key: Option<String>,
    pub exiftool: Option<PathBuf>,
    pub exiftool_config: Option<PathBuf>,
    pub namespace_prefix: Option<String>,
    pub namespace_uri: Option<String>,
    pub auth_base: Option<String>,
    pub api_base: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub tool_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field(
                "subscription_key",
                &self.subscription_key.as_ref().map(|_| "<redacted>"),
            )
            .field("exiftool", &self.exiftool)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn parse(path: &Path, contents: &str) -> Result<Self, SettingsError> {
        toml::from_str(contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(path, &contents)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load the explicitly requested file, or the default one if it exists.
    fn discover(explicit: Option<&str>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::load(&expand_tilde(path)),
            None => {
                let default_path = expand_tilde(DEFAULT_SETTINGS_FILE);
                if default_path.is_file() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Application configuration, resolved once at startup.
///
/// Prompted values (username, password, category, directory) stay optional
/// here; the run asks for whatever is still missing.
pub struct Config {
    pub username: Option<String>,
    pub password: Option<String>,
    pub category: Option<String>,
    pub directory: Option<String>,
    pub client: ClientCredentials,
    pub subscription_key: String,
    pub endpoints: Endpoints,
    pub exiftool: PathBuf,
    pub exiftool_config: PathBuf,
    pub namespace: Namespace,
    pub http_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("category", &self.category)
            .field("directory", &self.directory)
            .field("client", &self.client)
            .field("subscription_key", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .field("exiftool", &self.exiftool)
            .field("exiftool_config", &self.exiftool_config)
            .field("namespace", &self.namespace)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Zero disables the timeout.
fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}

fn required(value: Option<String>, name: &'static str) -> Result<String, SettingsError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(SettingsError::Missing(name))
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> anyhow::Result<Self> {
        let settings = Settings::discover(cli.settings.as_deref())?;
        Self::from_parts(cli, settings)
    }

    /// Layer CLI/env values over the settings file over built-in defaults.
    pub fn from_parts(cli: crate::cli::Cli, settings: Settings) -> anyhow::Result<Self> {
        let client = ClientCredentials {
            client_id: required(cli.client_id.or(settings.client_id), "client_id")?,
            client_secret: required(cli.client_secret.or(settings.client_secret), "client_secret")?,
        };
        let subscription_key = required(
            cli.subscription_key.or(settings.subscription_key),
            "subscription_key",
        )?;

        let endpoints = Endpoints::new(
            cli.auth_base
                .or(settings.auth_base)
                .as_deref()
                .unwrap_or(DEFAULT_AUTH_BASE),
            cli.api_base
                .or(settings.api_base)
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE),
        )?;

        let namespace = Namespace::new(
            cli.namespace_prefix
                .or(settings.namespace_prefix)
                .as_deref()
                .unwrap_or(DEFAULT_NAMESPACE_PREFIX),
            cli.namespace_uri
                .or(settings.namespace_uri)
                .as_deref()
                .unwrap_or(DEFAULT_NAMESPACE_URI),
        )?;

        let exiftool = cli
            .exiftool
            .or(settings.exiftool)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXIFTOOL));
        let exiftool_config = cli
            .exiftool_config
            .or(settings.exiftool_config)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Ok(Self {
            username: cli.username.or(settings.username),
            password: cli.password,
            category: cli.category,
            directory: cli.directory,
            client,
            subscription_key,
            endpoints,
            exiftool,
            exiftool_config,
            namespace,
            http_timeout: timeout_from_secs(cli.http_timeout.or(settings.http_timeout_secs)),
            tool_timeout: timeout_from_secs(cli.tool_timeout.or(settings.tool_timeout_secs)),
            dry_run: cli.dry_run,
            no_progress_bar: cli.no_progress_bar,
        })
    }
}
