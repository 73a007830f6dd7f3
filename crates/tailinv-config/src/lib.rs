//! Configuration for tailinv.
//!
//! Layered loading (defaults, TOML or YAML file, `TAILINV_` environment),
//! the `{{ ... }}` template pass, client-secret resolution (flag, keyring,
//! plaintext), and translation to `tailinv_core::InventoryConfig`. The CLI
//! applies its flags on top of the loaded [`Config`] before translating.

pub mod template;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use tailinv_core::{InventoryConfig, TlsVerification, default_token_cache_path};

/// Keyring service under which client secrets are stored.
pub const KEYRING_SERVICE: &str = "tailinv";

/// Plugin names accepted in an Ansible-style `plugin:` key.
const PLUGIN_NAME: &str = "tailscale";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing required setting '{field}'")]
    MissingField { field: &'static str },

    #[error("no client secret configured for OAuth client '{client_id}'")]
    NoCredentials { client_id: String },

    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("cannot template {field}: {reason}")]
    Template { field: String, reason: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── File config ─────────────────────────────────────────────────────

/// Settings as written in the config file, before templating and
/// credential resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Ansible inventory plugin name, present in `*.tailscale.yml` sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret (plaintext; prefer the keyring or env).
    pub client_secret: Option<String>,

    /// Tailnet name, or `-` for the OAuth client's default tailnet.
    pub tailnet: Option<String>,

    /// Tag filter. Empty selects every device.
    #[serde(default)]
    pub tags: Vec<String>,

    /// OAuth scopes to request.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Override the Tailscale API base URL.
    pub api_base: Option<String>,

    /// Override the OAuth token endpoint.
    pub token_url: Option<String>,

    /// Override the token cache location.
    pub token_cache: Option<PathBuf>,

    /// Extra CA certificate (PEM) to trust.
    pub ca_cert: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugin: None,
            client_id: None,
            client_secret: None,
            tailnet: None,
            tags: Vec::new(),
            scopes: Vec::new(),
            api_base: None,
            token_url: None,
            token_cache: None,
            ca_cert: None,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Copy with the plaintext secret masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            client_secret: self.client_secret.as_ref().map(|_| "********".into()),
            ..self.clone()
        }
    }

    /// Resolve `{{ ... }}` expressions in the templatable settings.
    pub fn apply_templates<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, value) in [
            ("client_id", &mut self.client_id),
            ("client_secret", &mut self.client_secret),
            ("tailnet", &mut self.tailnet),
        ] {
            if let Some(v) = value.as_mut() {
                if template::is_template(v) {
                    *v = template::render(field, v, &lookup)?;
                }
            }
        }

        for tag in &mut self.tags {
            if template::is_template(tag) {
                *tag = template::render("tags", tag, &lookup)?;
            }
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tailinv", "tailinv").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("tailinv");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from file + environment and run the template pass.
///
/// Precedence, lowest first: defaults, `TAILNET`, the file, `TAILINV_*`.
///
/// With `path: None` the default location is used and may be absent. An
/// explicitly given file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };
    debug!(path = %path.display(), "loading config");

    // Plain `TAILNET` ranks below the file; `TAILINV_TAILNET` above it.
    let mut figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Env::raw().only(&["tailnet"]));
    figment = if is_yaml(&path) {
        figment.merge(Yaml::file(&path))
    } else {
        figment.merge(Toml::file(&path))
    };
    figment = figment.merge(Env::prefixed("TAILINV_").ignore(&["config"]));

    let mut config: Config = figment.extract()?;
    validate_plugin(config.plugin.as_deref())?;
    config.apply_templates(|name| std::env::var(name).ok())?;
    Ok(config)
}

/// Accept `tailscale` or a fully-qualified `<namespace>.<collection>.tailscale`.
fn validate_plugin(plugin: Option<&str>) -> Result<(), ConfigError> {
    match plugin {
        None => Ok(()),
        Some(name)
            if name == PLUGIN_NAME
                || name.rsplit_once('.').is_some_and(|(_, last)| last == PLUGIN_NAME) =>
        {
            Ok(())
        }
        Some(other) => Err(ConfigError::Validation {
            field: "plugin".into(),
            reason: format!("expected '{PLUGIN_NAME}', got '{other}'"),
        }),
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring entry name for a client's secret.
pub fn keyring_entry_name(client_id: &str) -> String {
    format!("{client_id}/client-secret")
}

fn keyring_lookup(client_id: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_entry_name(client_id))
        .and_then(|entry| entry.get_password())
        .inspect_err(|e| debug!(error = %e, "no keyring secret"))
        .ok()
}

/// Store a client secret in the system keyring.
pub fn store_client_secret(client_id: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_entry_name(client_id))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the client secret: explicit override, then the system
/// keyring, then plaintext in the config.
pub fn resolve_client_secret(
    config: &Config,
    client_id: &str,
    explicit: Option<SecretString>,
) -> Result<SecretString, ConfigError> {
    resolve_client_secret_with(config, client_id, explicit, keyring_lookup)
}

fn resolve_client_secret_with<K>(
    config: &Config,
    client_id: &str,
    explicit: Option<SecretString>,
    keyring: K,
) -> Result<SecretString, ConfigError>
where
    K: Fn(&str) -> Option<String>,
{
    // 1. Flag / env
    if let Some(secret) = explicit {
        return Ok(secret);
    }

    // 2. System keyring
    if let Some(secret) = keyring(client_id) {
        debug!("client secret from keyring");
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(secret) = config.client_secret.as_ref().filter(|s| !s.is_empty()) {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        client_id: client_id.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the immutable `InventoryConfig` for one run.
pub fn to_inventory_config(
    config: &Config,
    explicit_secret: Option<SecretString>,
) -> Result<InventoryConfig, ConfigError> {
    to_inventory_config_with(config, explicit_secret, keyring_lookup)
}

fn to_inventory_config_with<K>(
    config: &Config,
    explicit_secret: Option<SecretString>,
    keyring: K,
) -> Result<InventoryConfig, ConfigError>
where
    K: Fn(&str) -> Option<String>,
{
    let client_id = required(config.client_id.as_deref(), "client_id")?;
    let tailnet = required(config.tailnet.as_deref(), "tailnet")?;
    let secret = resolve_client_secret_with(config, client_id, explicit_secret, keyring)?;

    if config.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let mut out = InventoryConfig::new(tailnet, client_id, secret);
    out.tags.clone_from(&config.tags);
    out.scopes.clone_from(&config.scopes);
    if let Some(ref base) = config.api_base {
        out.api_base = parse_url("api_base", base)?;
    }
    if let Some(ref url) = config.token_url {
        out.token_url = parse_url("token_url", url)?;
    }
    out.token_cache = config
        .token_cache
        .clone()
        .unwrap_or_else(default_token_cache_path);
    if let Some(ref ca) = config.ca_cert {
        out.tls = TlsVerification::CustomCa(ca.clone());
    }
    out.timeout = Duration::from_secs(config.timeout);
    Ok(out)
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField { field })
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{value}': {e}"),
    })
}
