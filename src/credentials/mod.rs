//! API key resolution.
//!
//! A key configured explicitly on the connection wins, even when it is
//! empty. Otherwise the environment variable is consulted. An empty result
//! after fallback is a configuration error.

use anyhow::{bail, Result};
use tracing::debug;

/// Resolves a credential from explicit configuration or `env_var`.
///
/// `setting` names the config field in the error message.
pub fn resolve_credential(explicit: Option<&str>, env_var: &str, setting: &str) -> Result<String> {
    let value = match explicit {
        Some(value) => value.to_string(),
        None => {
            debug!(env_var = %env_var, "No {} configured, reading environment", setting);
            std::env::var(env_var).unwrap_or_default()
        }
    };

    if value.is_empty() {
        bail!(
            "{} must be configured in the connection config or the {} environment variable",
            setting,
            env_var
        );
    }
    Ok(value)
}
