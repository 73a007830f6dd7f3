// OAuth2 client-credentials authentication
//
// Exchanges a Tailscale OAuth client ID/secret for a short-lived bearer
// token. Persisting the token is the caller's job; this module only talks
// to the token endpoint.

use std::fmt;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Default Tailscale OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.tailscale.com/api/v2/oauth/token";

/// A bearer token, as obtained from the token endpoint and as cached on disk.
///
/// A `Token` is only ever constructed with a non-empty `access_token`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Absolute expiry, derived from `expires_in` at issue time.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Remaining fields of the token response (`scope`, ...), kept opaque.
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

impl Token {
    /// Build a token from a token-endpoint response received at `issued_at`.
    ///
    /// Fails if `expires_in` does not land on a representable instant.
    pub fn from_response(
        response: TokenResponse,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let expires_at = match response.expires_in {
            Some(secs) => Some(
                TimeDelta::try_seconds(secs)
                    .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
                    .ok_or_else(|| Error::Authentication {
                        status: None,
                        body: format!("token response has an out-of-range expires_in ({secs})"),
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(default_token_type),
            expires_at,
            raw: response.raw,
        })
    }

    /// Whether the token is expired at `now`, treating anything within
    /// `skew` of the expiry as already expired. Tokens without a recorded
    /// expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at.is_some_and(|exp| now + skew >= exp)
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("raw", &self.raw)
            .finish()
    }
}

/// Token endpoint response body (RFC 6749 §5.1).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

/// OAuth2 client-credentials client for the Tailscale token endpoint.
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: Url,
    scopes: Vec<String>,
    timeout_secs: u64,
}

impl OAuthClient {
    /// Create a client with its own `reqwest::Client` built from `transport`.
    pub fn new(token_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            token_url,
            scopes: Vec::new(),
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, token_url: Url, timeout_secs: u64) -> Self {
        Self {
            http,
            token_url,
            scopes: Vec::new(),
            timeout_secs,
        }
    }

    /// Request these scopes with every token. Empty means "whatever the
    /// OAuth client was granted".
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Perform the client-credentials exchange.
    ///
    /// `POST {token_url}` with `grant_type=client_credentials`, the client
    /// credentials in HTTP Basic auth.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<Token, Error> {
        debug!(url = %self.token_url, "requesting OAuth token");

        let mut form = vec![("grant_type", "client_credentials".to_owned())];
        if !self.scopes.is_empty() {
            form.push(("scope", self.scopes.join(" ")));
        }

        let resp = self
            .http
            .post(self.token_url.clone())
            .basic_auth(client_id, Some(client_secret.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                body,
            });
        }

        let response: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                status: Some(status.as_u16()),
                body: format!("malformed token response: {e}"),
            })?;

        if response.access_token.is_empty() {
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                body: "token response has no access_token".into(),
            });
        }

        let token = Token::from_response(response, Utc::now()).map_err(|e| match e {
            Error::Authentication { body, .. } => Error::Authentication {
                status: Some(status.as_u16()),
                body,
            },
            other => other,
        })?;
        debug!(expires_at = ?token.expires_at, "OAuth token issued");
        Ok(token)
    }

    /// Timeouts stay timeouts; any other transport failure while talking
    /// to the token endpoint is an authentication failure.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        match Error::from_transport(err, self.timeout_secs) {
            Error::Transport(e) => Error::Authentication {
                status: None,
                body: e.to_string(),
            },
            other => other,
        }
    }
}
