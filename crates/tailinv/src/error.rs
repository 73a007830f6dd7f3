//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tailinv_config::ConfigError;
use tailinv_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(tailinv::connection_failed),
        help("Check network access to the Tailscale API, or --api-base / --token-url if overridden.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{operation} timed out after {seconds}s")]
    #[diagnostic(
        code(tailinv::timeout),
        help("Increase the budget with --timeout or TAILINV_TIMEOUT.")
    )]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(tailinv::auth_failed),
        help(
            "Verify the OAuth client ID and secret in the Tailscale admin console.\n\
             The client needs at least the devices:core:read scope."
        )
    )]
    AuthFailed { message: String },

    #[error("No client secret configured for OAuth client '{client_id}'")]
    #[diagnostic(
        code(tailinv::no_credentials),
        help(
            "Set TAILSCALE_CLIENT_SECRET, pass --client-secret,\n\
             or store it with: tailinv config set-secret"
        )
    )]
    NoCredentials { client_id: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Tailscale API error (HTTP {status}): {message}")]
    #[diagnostic(code(tailinv::api_error))]
    ApiError { status: u16, message: String },

    #[error("Tailnet not found (HTTP 404): {message}")]
    #[diagnostic(
        code(tailinv::not_found),
        help("Check the tailnet name, or use \"-\" for the OAuth client's default tailnet.")
    )]
    NotFound { message: String },

    // ── Inventory ────────────────────────────────────────────────────
    #[error("Device '{device}' cannot be added to the inventory: {reason}")]
    #[diagnostic(code(tailinv::precondition))]
    Precondition { device: String, reason: String },

    // ── Token cache ──────────────────────────────────────────────────
    #[error("Token cache error at {path}: {reason}")]
    #[diagnostic(
        code(tailinv::token_cache),
        help("Remove it with: tailinv token clear")
    )]
    TokenCache { path: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Missing required setting '{field}'")]
    #[diagnostic(
        code(tailinv::missing_setting),
        help("Pass --{flag}, set {env}, or add `{field}` to the config file.")
    )]
    MissingSetting {
        field: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tailinv::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(tailinv::no_config),
        help("Check --config / TAILINV_CONFIG. The default location is optional.")
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(tailinv::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(tailinv::keyring),
        help("Use TAILSCALE_CLIENT_SECRET or client_secret in the config file instead.")
    )]
    Keyring(String),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(tailinv::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::MissingSetting { .. }
            | Self::Validation { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::ApiError { .. }
            | Self::Precondition { .. }
            | Self::TokenCache { .. }
            | Self::Keyring(_)
            | Self::Internal(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            err @ CoreError::Authentication { .. } => CliError::AuthFailed {
                message: err.to_string(),
            },

            CoreError::Api { status: 404, body } => CliError::NotFound { message: body },
            CoreError::Api { status, body } => CliError::ApiError {
                status,
                message: body,
            },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout {
                operation,
                timeout_secs,
            } => CliError::Timeout {
                operation,
                seconds: timeout_secs,
            },

            CoreError::PreconditionViolation { device, reason } => {
                CliError::Precondition { device, reason }
            }

            CoreError::CorruptCache { path, reason } => CliError::TokenCache {
                path: path.display().to_string(),
                reason,
            },
            CoreError::TokenCacheIo { path, source } => CliError::TokenCache {
                path: path.display().to_string(),
                reason: source.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::MissingField { field } => missing_setting(field),
            ConfigError::NoCredentials { client_id } => CliError::NoCredentials { client_id },
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Template { field, reason } => CliError::Validation { field, reason },
            ConfigError::Keyring(message) => CliError::Keyring(message),
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}

fn missing_setting(field: &'static str) -> CliError {
    let (flag, env) = match field {
        "client_id" => ("client-id", "TAILSCALE_CLIENT_ID"),
        "tailnet" => ("tailnet", "TAILNET_NAME"),
        _ => ("help", "the matching TAILINV_ variable"),
    };
    CliError::MissingSetting { field, flag, env }
}
