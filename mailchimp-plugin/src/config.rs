use anyhow::{anyhow, Result};
use serde::Deserialize;
use tablekit::config::ServerConfig;
use tablekit::credentials::resolve_credential;

/// Environment variable consulted when no `api_key` is configured.
pub const API_KEY_ENV: &str = "MAILCHIMP_API_KEY";

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_ENV: &str = "MAILCHIMP_PLUGIN_CONFIG";

pub const DEFAULT_CONNECTION_NAME: &str = "mailchimp";

/// Top-level plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub connection: MailchimpConnectionConfig,
}

/// Settings of one Mailchimp connection.
///
/// ```toml
/// [connection]
/// name = "mailchimp"
/// api_key = "0123456789abcdef-us6"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MailchimpConnectionConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// API key; falls back to `MAILCHIMP_API_KEY` when absent.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the data-center URL derived from the key.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_name() -> String {
    DEFAULT_CONNECTION_NAME.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for MailchimpConnectionConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MailchimpConnectionConfig {
    /// The API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_credential(self.api_key.as_deref(), API_KEY_ENV, "api_key")
    }

    /// The API base URL: explicit `base_url`, else derived from the key.
    pub fn resolve_base_url(&self, api_key: &str) -> Result<String> {
        match &self.base_url {
            Some(url) => Ok(url.trim_end_matches('/').to_string()),
            None => base_url_for_key(api_key),
        }
    }
}

/// `https://{dc}.api.mailchimp.com/3.0`, where `dc` is the suffix of the
/// key after its last `-`.
pub fn base_url_for_key(api_key: &str) -> Result<String> {
    let dc = api_key
        .rsplit_once('-')
        .map(|(_, dc)| dc)
        .filter(|dc| !dc.is_empty())
        .ok_or_else(|| anyhow!("api_key has no data center suffix (expected <key>-<dc>)"))?;
    Ok(format!("https://{}.api.mailchimp.com/3.0", dc))
}
