//! URL endpoints for the MediaValet login and API hosts. Both bases are
//! configurable so the tool can be pointed at a staging tenant or a mock.

pub const DEFAULT_AUTH_BASE: &str = "https://login.mediavalet.com";
pub const DEFAULT_API_BASE: &str = "https://api.mediavalet.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_base: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Build endpoints from two base URLs, dropping any trailing slash.
    ///
    /// Only `http` and `https` bases are accepted.
    pub fn new(auth_base: &str, api_base: &str) -> anyhow::Result<Self> {
        Ok(Self {
            auth_base: normalize_base(auth_base)?,
            api_base: normalize_base(api_base)?,
        })
    }

    /// OAuth password-grant endpoint.
    pub fn token(&self) -> String {
        format!("{}/connect/token", self.auth_base)
    }

    pub fn attributes(&self) -> String {
        format!("{}/attributes", self.api_base)
    }

    pub fn assets(&self) -> String {
        format!("{}/assets", self.api_base)
    }
}

fn normalize_base(base: &str) -> anyhow::Result<String> {
    let trimmed = base.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        anyhow::bail!("Base URL '{}' must start with http:// or https://", base);
    }
    Ok(trimmed.to_string())
}
