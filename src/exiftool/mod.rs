//! ExifTool integration: writes the library's custom attributes into a
//! user-defined XMP namespace. A config file declaring the namespace and
//! its tags is generated once per run; ExifTool is then invoked once per
//! local file with that config.

pub mod config;
pub mod error;
pub mod folder;
pub mod writer;

use self::error::ConfigError;

pub const DEFAULT_NAMESPACE_PREFIX: &str = "mv";
pub const DEFAULT_NAMESPACE_URI: &str = "http://my.custom.namespace/";

/// Custom XMP namespace the attributes are written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub uri: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            uri: DEFAULT_NAMESPACE_URI.to_string(),
        }
    }
}

impl Namespace {
    /// The prefix becomes a Perl hash key and part of the ExifTool group
    /// name, so it must be a non-empty ASCII identifier. The URI is quoted
    /// in the config and may not contain a single quote.
    pub fn new(prefix: &str, uri: &str) -> Result<Self, ConfigError> {
        let valid_prefix = prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_prefix {
            return Err(ConfigError::InvalidNamespace(format!(
                "prefix '{}' must start with a letter and contain only letters, digits or '_'",
                prefix
            )));
        }
        if uri.is_empty() || uri.contains('\'') {
            return Err(ConfigError::InvalidNamespace(format!(
                "URI '{}' must be non-empty and contain no single quotes",
                uri
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        })
    }

    /// ExifTool family-1 group name, e.g. `XMP-mv`.
    pub fn group(&self) -> String {
        format!("XMP-{}", self.prefix)
    }
}

/// XMP tag identifier for an attribute display name: spaces removed.
pub fn tag_name(display_name: &str) -> String {
    display_name.chars().filter(|c| *c != ' ').collect()
}
