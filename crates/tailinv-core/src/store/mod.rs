pub mod token_store;

pub use token_store::{
    EXPIRY_SKEW_SECS, TokenStatus, TokenStore, default_token_cache_path, is_stale,
};
