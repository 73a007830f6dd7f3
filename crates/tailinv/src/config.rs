//! CLI configuration: thin wrapper around `tailinv_config`.
//!
//! Loads the layered config and applies `GlobalOpts` flags on top
//! (flags > env > file > defaults) before translating to the core config.

use std::path::PathBuf;

use secrecy::SecretString;

use tailinv_config::Config;
use tailinv_core::{InventoryConfig, default_token_cache_path};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config` if given, else the default path.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(tailinv_config::config_path)
}

/// Load the config file and environment, then apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = tailinv_config::load_config(global.config.as_deref())?;
    apply_overrides(&mut config, global);
    Ok(config)
}

/// Overlay flag values onto `config`. The client secret is not copied; it
/// enters credential resolution as the explicit override instead.
pub fn apply_overrides(config: &mut Config, global: &GlobalOpts) {
    if let Some(ref id) = global.client_id {
        config.client_id = Some(id.clone());
    }
    if let Some(ref tailnet) = global.tailnet {
        config.tailnet = Some(tailnet.clone());
    }
    if let Some(ref path) = global.token_cache {
        config.token_cache = Some(path.clone());
    }
    if let Some(ref base) = global.api_base {
        config.api_base = Some(base.clone());
    }
    if let Some(ref url) = global.token_url {
        config.token_url = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
}

/// Build the run configuration. Non-empty `tags` replace the configured
/// tag filter.
pub fn build_inventory_config(
    global: &GlobalOpts,
    tags: &[String],
) -> Result<InventoryConfig, CliError> {
    let mut config = load(global)?;
    if !tags.is_empty() {
        config.tags = tags.to_vec();
    }

    let explicit = global
        .client_secret
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::from(s.clone()));

    Ok(tailinv_config::to_inventory_config(&config, explicit)?)
}

/// Token cache location without requiring credentials.
pub fn token_cache_path(global: &GlobalOpts) -> Result<PathBuf, CliError> {
    let config = load(global)?;
    Ok(config.token_cache.unwrap_or_else(default_token_cache_path))
}
