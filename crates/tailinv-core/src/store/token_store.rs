// ── File-backed token cache ──
//
// One JSON file holding the last bearer token. The store is a pure cache:
// it never checks expiry, it only answers "is there a well-formed token".

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CoreError;
use crate::model::Token;

/// Cached tokens this close to expiry are treated as expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Whether `token` should no longer be presented to the API.
pub fn is_stale(token: &Token) -> bool {
    token.is_expired_at(Utc::now(), Duration::seconds(EXPIRY_SKEW_SECS))
}

/// State of the token cache, as seen without touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TokenStatus {
    /// No cache file.
    Missing,
    /// The cache file exists but cannot be used.
    Corrupt { reason: String },
    /// A token is cached but past (or about to pass) its expiry.
    Expired { expires_at: DateTime<Utc> },
    /// A usable token is cached. `None` expiry means the endpoint gave none.
    Valid { expires_at: Option<DateTime<Utc>> },
}

/// Default cache location: the platform cache dir, e.g.
/// `~/.cache/tailinv/token.json` on Linux.
pub fn default_token_cache_path() -> PathBuf {
    ProjectDirs::from("com", "tailinv", "tailinv").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".cache");
            p.push("tailinv");
            p.push("token.json");
            p
        },
        |dirs| dirs.cache_dir().join("token.json"),
    )
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token.
    ///
    /// A missing file is `Ok(None)`. A file that cannot be read, does not
    /// parse, or holds an empty `access_token` is [`CoreError::CorruptCache`].
    pub fn load(&self) -> Result<Option<Token>, CoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached token");
                return Ok(None);
            }
            Err(e) => return Err(self.corrupt(format!("unreadable: {e}"))),
        };

        let token: Token = serde_json::from_str(&contents)
            .map_err(|e| self.corrupt(format!("invalid JSON: {e}")))?;

        if token.access_token.is_empty() {
            return Err(self.corrupt("access_token is empty".into()));
        }

        debug!(path = %self.path.display(), "loaded cached token");
        Ok(Some(token))
    }

    /// Persist `token`, replacing any previous cache file.
    ///
    /// The token is written to a temporary file next to the cache and
    /// renamed over it, so readers see the old file or the new one, never
    /// a partial write. The temporary file is created owner-only (0600 on
    /// Unix) and keeps that mode through the rename.
    pub fn save(&self, token: &Token) -> Result<(), CoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| self.io(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io(e))?;
        serde_json::to_writer_pretty(&mut tmp, token)
            .map_err(|e| self.io(io::Error::other(e)))?;
        tmp.write_all(b"\n").map_err(|e| self.io(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io(e))?;
        tmp.persist(&self.path).map_err(|e| self.io(e.error))?;

        debug!(path = %self.path.display(), "token cached");
        Ok(())
    }

    /// Classify the cache contents.
    pub fn status(&self) -> TokenStatus {
        match self.load() {
            Ok(None) => TokenStatus::Missing,
            Ok(Some(token)) => match token.expires_at {
                Some(expires_at) if is_stale(&token) => TokenStatus::Expired { expires_at },
                expires_at => TokenStatus::Valid { expires_at },
            },
            Err(CoreError::CorruptCache { reason, .. }) => TokenStatus::Corrupt { reason },
            Err(other) => TokenStatus::Corrupt {
                reason: other.to_string(),
            },
        }
    }

    /// Delete the cache file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, CoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "token cache cleared");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io(e)),
        }
    }

    fn corrupt(&self, reason: String) -> CoreError {
        CoreError::CorruptCache {
            path: self.path.clone(),
            reason,
        }
    }

    fn io(&self, source: io::Error) -> CoreError {
        CoreError::TokenCacheIo {
            path: self.path.clone(),
            source,
        }
    }
}
