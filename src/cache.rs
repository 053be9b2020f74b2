//! Injected key-value cache with time-based expiry.
//!
//! The pipeline never assumes a storage medium: callers hand it anything
//! implementing [`Cache`]. Entries carry their capture timestamp; freshness
//! is the caller's policy (1 hour for visitor records, 24 hours for
//! weather observations).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Visitor-record entries stay fresh for one hour.
pub const VISITOR_TTL_SECS: i64 = 60 * 60;
/// Weather entries stay fresh for 24 hours.
pub const WEATHER_TTL_SECS: i64 = 24 * 60 * 60;

/// Cache key for the parsed visitor-record set.
pub const VISITOR_RECORDS_KEY: &str = "visitor_records";

/// Cache key for one day's weather observation.
pub fn weather_key(iso_date: &str) -> String {
    format!("weather:{iso_date}")
}

/// A cached payload together with the instant it was captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub captured_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl Entry {
    /// Wraps a serializable value with the current capture time.
    pub fn new(payload: &impl Serialize) -> Result<Self> {
        Ok(Self {
            captured_at: Utc::now(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Whether the entry is younger than `ttl_secs`.
    pub fn is_fresh(&self, ttl_secs: i64) -> bool {
        (Utc::now() - self.captured_at).num_seconds() < ttl_secs
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Minimal cache capability: lookup and store by string key.
pub trait Cache {
    fn get(&self, key: &str) -> Option<Entry>;
    fn put(&mut self, key: &str, entry: Entry);
}

/// In-memory cache, used by tests and as a null store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, Entry>,
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Entry> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, entry: Entry) {
        self.entries.insert(key.to_string(), entry);
    }
}

/// File-backed cache: one JSON object on disk mapping keys to entries.
///
/// A missing file starts empty; an unreadable file is logged and treated as
/// empty rather than failing the command. Writes persist eagerly.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: HashMap<String, Entry>,
}

impl FileCache {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Cache file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cache file unreadable, starting empty");
                HashMap::new()
            }
        };

        Self { path, entries }
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                error!(path = %self.path.display(), error = %err, "Failed to create cache directory");
                return;
            }
        }

        match serde_json::to_vec_pretty(&self.entries) {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(&self.path, bytes) {
                    error!(path = %self.path.display(), error = %err, "Failed to persist cache");
                }
            }
            Err(err) => error!(error = %err, "Failed to serialize cache"),
        }
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<Entry> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, entry: Entry) {
        self.entries.insert(key.to_string(), entry);
        self.persist();
    }
}

/// Resolves the cache file location from `CACHE_PATH`, defaulting to
/// `data/cache.json`.
pub fn resolve_cache_path() -> PathBuf {
    match std::env::var("CACHE_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => Path::new("data").join("cache.json"),
    }
}
