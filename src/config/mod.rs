//! TOML configuration loading.
//!
//! Plugins define their own top-level config struct (usually a `[server]`
//! section plus a `[connection]` section) and load it with [`load_config`]
//! or [`load_from_env`]. Every field has a default, so an absent file or an
//! empty one yields a usable configuration.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3002
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `bind:port`, suitable for `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Parses a TOML document.
pub fn parse_config<T: DeserializeOwned>(contents: &str) -> Result<T> {
    toml::from_str(contents).context("Failed to parse config")
}

/// Loads configuration from a TOML file.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Loads configuration from the file named by `env_var`, or defaults when
/// the variable is unset.
pub fn load_from_env<T: DeserializeOwned + Default>(env_var: &str) -> Result<T> {
    match std::env::var(env_var) {
        Ok(path) if !path.is_empty() => {
            info!(path = %path, "Loading config");
            load_config(path)
        }
        _ => {
            info!(env_var = %env_var, "No config file set, using defaults");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[derive(Debug, Default, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        server: ServerConfig,
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 3002);
        assert_eq!(config.address(), "127.0.0.1:3002");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TestConfig = parse_config(
            r#"
            [server]
            port = 8080
        "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.name.is_none());

        let empty: TestConfig = parse_config("").unwrap();
        assert_eq!(empty.server, ServerConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let result: Result<TestConfig> = parse_config("[server]\nport = \"high\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"prod\"\n[server]\nbind = \"0.0.0.0\"").unwrap();

        let config: TestConfig = load_config(file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("prod"));
        assert_eq!(config.server.address(), "0.0.0.0:3002");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config::<TestConfig>("/nonexistent/plugin.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TABLEKIT_TEST_CONFIG");
        let config: TestConfig = load_from_env("TABLEKIT_TEST_CONFIG").unwrap();
        assert_eq!(config.server.port, 3002);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();
        std::env::set_var("TABLEKIT_TEST_CONFIG", file.path());
        let config: TestConfig = load_from_env("TABLEKIT_TEST_CONFIG").unwrap();
        assert_eq!(config.server.port, 9000);
        std::env::remove_var("TABLEKIT_TEST_CONFIG");
    }
}
