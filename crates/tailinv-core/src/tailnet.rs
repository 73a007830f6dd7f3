// ── Tailnet facade ──
//
// Ties the token cache, the OAuth exchange and the device listing into
// the three things callers want: a usable token, the device list, and
// the grouped inventory. One request in flight at a time.

use tracing::{debug, info, warn};

use tailinv_api::{OAuthClient, TailscaleClient, TlsMode, TransportConfig};

use crate::config::{InventoryConfig, TlsVerification};
use crate::error::CoreError;
use crate::inventory::InventoryBuilder;
use crate::model::{Device, InventoryResult, TagFilter, Token};
use crate::store::{TokenStatus, TokenStore, is_stale};

/// Where a token handed out by [`Tailnet::token`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    Cache,
    Fresh,
}

/// Authenticated access to one tailnet.
pub struct Tailnet {
    config: InventoryConfig,
    store: TokenStore,
    oauth: OAuthClient,
    api: TailscaleClient,
}

impl Tailnet {
    /// Build the HTTP clients and token store for `config`. No network
    /// traffic happens until a token or the device list is requested.
    pub fn new(config: InventoryConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let oauth = OAuthClient::new(config.token_url.clone(), &transport)?
            .with_scopes(config.scopes.clone());
        let api = TailscaleClient::new(config.api_base.clone(), &transport)?;
        let store = TokenStore::new(config.token_cache.clone());

        Ok(Self {
            config,
            store,
            oauth,
            api,
        })
    }

    /// Access the token cache.
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    // ── Tokens ───────────────────────────────────────────────────────

    /// A usable bearer token: the cached one if it is well-formed and not
    /// expired, otherwise a freshly issued (and cached) one.
    pub async fn token(&self) -> Result<Token, CoreError> {
        self.acquire_token().await.map(|(token, _)| token)
    }

    /// Discard any cached token and authenticate unconditionally.
    pub async fn refresh_token(&self) -> Result<Token, CoreError> {
        self.store.clear()?;
        self.authenticate().await
    }

    /// Inspect the cache without authenticating.
    pub fn token_status(&self) -> TokenStatus {
        self.store.status()
    }

    async fn acquire_token(&self) -> Result<(Token, TokenSource), CoreError> {
        match self.store.load() {
            Ok(Some(token)) if is_stale(&token) => {
                info!(expires_at = ?token.expires_at, "cached token expired");
            }
            Ok(Some(token)) => {
                debug!("using cached token");
                return Ok((token, TokenSource::Cache));
            }
            Ok(None) => {}
            Err(err @ CoreError::CorruptCache { .. }) => {
                warn!(error = %err, "ignoring unusable token cache");
            }
            Err(other) => return Err(other),
        }

        let token = self.authenticate().await?;
        Ok((token, TokenSource::Fresh))
    }

    /// Run the client-credentials exchange and cache the result.
    async fn authenticate(&self) -> Result<Token, CoreError> {
        info!(token_url = %self.oauth.token_url(), "authenticating with OAuth client credentials");
        let token = self
            .oauth
            .authenticate(&self.config.client_id, &self.config.client_secret)
            .await
            .map_err(|e| CoreError::from_api(e, "authentication"))?;
        self.store.save(&token)?;
        Ok(token)
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Every device in the configured tailnet, in API order.
    ///
    /// A cached token the API rejects with 401 is discarded and the
    /// request is repeated once with a fresh token.
    pub async fn devices(&self) -> Result<Vec<Device>, CoreError> {
        let (token, source) = self.acquire_token().await?;

        match self.api.list_devices(&self.config.tailnet, &token).await {
            Ok(list) => Ok(list.devices),
            Err(err) if source == TokenSource::Cache && err.is_unauthorized() => {
                warn!("cached token rejected by the API, re-authenticating");
                self.store.clear()?;
                let token = self.authenticate().await?;
                self.api
                    .list_devices(&self.config.tailnet, &token)
                    .await
                    .map(|list| list.devices)
                    .map_err(|e| CoreError::from_api(e, "device fetch"))
            }
            Err(err) => Err(CoreError::from_api(err, "device fetch")),
        }
    }

    /// Fetch the devices and group them using the configured tag filter.
    pub async fn inventory(&self) -> Result<InventoryResult, CoreError> {
        let filter = TagFilter::new(&self.config.tags);
        self.inventory_with(filter).await
    }

    /// Fetch the devices and group them using an explicit tag filter.
    pub async fn inventory_with(&self, filter: TagFilter) -> Result<InventoryResult, CoreError> {
        let devices = self.devices().await?;
        InventoryBuilder::new(filter).build(&devices)
    }
}

fn build_transport(config: &InventoryConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
    }
}
