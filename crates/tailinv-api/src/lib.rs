// tailinv-api: Async Rust client for the Tailscale management API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{DEFAULT_TOKEN_URL, OAuthClient, Token, TokenResponse};
pub use client::{DEFAULT_BASE_URL, TailscaleClient};
pub use error::Error;
pub use models::{Device, DeviceList};
pub use transport::{TlsMode, TransportConfig};
