// Tailscale API HTTP client
//
// Wraps `reqwest::Client` with Tailscale URL construction and bearer-token
// auth. One request, one response: no retry, no pagination.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Token;
use crate::error::Error;
use crate::models::DeviceList;
use crate::transport::TransportConfig;

/// Default Tailscale API v2 base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.tailscale.com/api/v2";

/// Raw HTTP client for the Tailscale management API.
pub struct TailscaleClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl TailscaleClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `https://api.tailscale.com/api/v2`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout_secs: u64) -> Self {
        Self {
            http,
            base_url,
            timeout_secs,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/tailnet/{tailnet}/{path}`.
    ///
    /// The tailnet name is pushed as a single path segment so names like
    /// `example.com` or `user@github` are encoded, never interpreted.
    pub(crate) fn tailnet_url(&self, tailnet: &str, path: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("tailnet")
            .push(tailnet)
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every device in the tailnet.
    ///
    /// `GET /tailnet/{tailnet}/devices`
    pub async fn list_devices(&self, tailnet: &str, token: &Token) -> Result<DeviceList, Error> {
        let url = self.tailnet_url(tailnet, "devices")?;
        debug!(tailnet, "listing devices");
        let list: DeviceList = self.get(url, token).await?;
        debug!(count = list.devices.len(), "devices received");
        Ok(list)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and decode a 200 JSON body.
    ///
    /// Any status other than 200 is an [`Error::Api`] carrying the raw body.
    async fn get<T: DeserializeOwned>(&self, url: Url, token: &Token) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;

        if status != reqwest::StatusCode::OK {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
