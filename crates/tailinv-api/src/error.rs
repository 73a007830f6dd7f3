use thiserror::Error;

/// Top-level error type for the `tailinv-api` crate.
///
/// Covers every failure mode of the two API surfaces this crate talks to:
/// the OAuth token endpoint and the tailnet device listing.
/// `tailinv-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The token endpoint rejected the client credentials, returned an
    /// unusable token, or could not be reached at all (`status: None`).
    #[error(
        "Authentication failed{}: {body}",
        .status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
    )]
    Authentication { status: Option<u16>, body: String },

    // ── API ─────────────────────────────────────────────────────────
    /// Non-200 response from a Tailscale API endpoint, with the raw body.
    #[error("Tailscale API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request did not complete within the configured budget.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the API rejected the bearer token as unauthorized.
    ///
    /// A cached token that produces this error is stale and should be
    /// discarded.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => *status,
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Translate a reqwest failure, promoting timeouts to [`Error::Timeout`].
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err)
        }
    }
}
