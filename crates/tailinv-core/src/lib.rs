//! Inventory logic between `tailinv-api` and the CLI.
//!
//! - **[`Tailnet`]**: facade over one tailnet. Serves a bearer token from
//!   the cache or a fresh OAuth exchange, lists devices (re-authenticating
//!   once when a cached token is rejected), and builds the inventory.
//!
//! - **[`TokenStore`]**: file-backed token cache written atomically with
//!   owner-only permissions.
//!
//! - **[`InventoryBuilder`]**: pure tag-based grouping of a device listing
//!   into hosts and `tag_<name>` groups, delivered through the
//!   [`InventorySink`] operations.

pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod store;
pub mod tailnet;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{InventoryConfig, TlsVerification, default_api_base, default_token_url};
pub use error::CoreError;
pub use inventory::InventoryBuilder;
pub use store::{TokenStatus, TokenStore, default_token_cache_path};
pub use tailnet::Tailnet;

pub use model::{
    ANSIBLE_HOST, Device, DeviceTag, GROUP_PREFIX, HostVars, InventoryResult, InventorySink,
    TAG_PREFIX, TagFilter, Token,
};
