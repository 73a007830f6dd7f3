// ── Core error types ──
//
// User-facing errors from tailinv-core. The `From<tailinv_api::Error>`
// impl translates transport-layer errors into domain variants; callers
// that know which operation failed use `CoreError::from_api` instead so
// timeouts name the operation.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error(
        "Authentication failed{}: {body}",
        .status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
    )]
    Authentication { status: Option<u16>, body: String },

    // ── Token cache ──────────────────────────────────────────────────
    #[error("Token cache at {} is corrupt: {reason}", .path.display())]
    CorruptCache { path: PathBuf, reason: String },

    #[error("Token cache I/O error at {}: {source}", .path.display())]
    TokenCacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Tailscale API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    // ── Inventory ────────────────────────────────────────────────────
    #[error("Device '{device}' cannot be added to the inventory: {reason}")]
    PreconditionViolation { device: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Translate an API error, naming the operation that produced it.
    pub fn from_api(err: tailinv_api::Error, operation: &'static str) -> Self {
        match err {
            tailinv_api::Error::Timeout { timeout_secs } => CoreError::Timeout {
                operation,
                timeout_secs,
            },
            other => other.into(),
        }
    }

    /// Returns `true` for errors the operator fixes by changing credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tailinv_api::Error> for CoreError {
    fn from(err: tailinv_api::Error) -> Self {
        match err {
            tailinv_api::Error::Authentication { status, body } => {
                CoreError::Authentication { status, body }
            }
            tailinv_api::Error::Api { status, body } => CoreError::Api { status, body },
            tailinv_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else if let Some(status) = e.status() {
                    CoreError::Api {
                        status: status.as_u16(),
                        body: e.to_string(),
                    }
                } else {
                    CoreError::Internal(format!("HTTP transport error: {e}"))
                }
            }
            tailinv_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tailinv_api::Error::Timeout { timeout_secs } => CoreError::Timeout {
                operation: "request",
                timeout_secs,
            },
            tailinv_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            tailinv_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
