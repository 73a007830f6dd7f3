// ── Runtime configuration ──
//
// Everything `Tailnet` needs to run, fully resolved: no template
// expressions, no file lookups. The CLI builds an `InventoryConfig`
// once at startup and hands it in; core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::store::default_token_cache_path;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled webpki roots (strict).
    #[default]
    SystemDefaults,
    /// Additionally trust a custom CA certificate file.
    CustomCa(PathBuf),
}

/// Immutable configuration for one inventory run against one tailnet.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Tailnet name (`example.com`, or `-` for the OAuth client's default).
    pub tailnet: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: SecretString,
    /// Tag filter, bare or `tag:`-prefixed names. Empty = every device.
    pub tags: Vec<String>,
    /// OAuth scopes to request. Empty = all scopes granted to the client.
    pub scopes: Vec<String>,
    /// Tailscale API base URL.
    pub api_base: Url,
    /// OAuth token endpoint.
    pub token_url: Url,
    /// Location of the token cache file.
    pub token_cache: PathBuf,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Budget for each network operation.
    pub timeout: Duration,
}

impl InventoryConfig {
    /// Config with the public Tailscale endpoints and default cache location.
    pub fn new(
        tailnet: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            tailnet: tailnet.into(),
            client_id: client_id.into(),
            client_secret,
            tags: Vec::new(),
            scopes: Vec::new(),
            api_base: default_api_base(),
            token_url: default_token_url(),
            token_cache: default_token_cache_path(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The public Tailscale API v2 base URL.
pub fn default_api_base() -> Url {
    Url::parse(tailinv_api::DEFAULT_BASE_URL).expect("built-in URL is valid")
}

/// The public Tailscale OAuth token endpoint.
pub fn default_token_url() -> Url {
    Url::parse(tailinv_api::DEFAULT_TOKEN_URL).expect("built-in URL is valid")
}
