// Key -> JSON value store for opaque UI preferences.
//
// Failures never reach the caller: a value that cannot be stored is dropped
// with a warning and a value that cannot be read is reported as absent.

use cached::{Cached, SizedCache};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Mutex;

pub const DEFAULT_CACHE_ENTRIES: usize = 256;
pub const DEFAULT_MAX_VALUE_BYTES: usize = 16 * 1024;

#[derive(Debug, thiserror::Error)]
enum CacheError {
    #[error("value for '{key}' is not serializable: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("value for '{key}' does not decode: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("value for '{key}' is {size} bytes, over the {limit} byte quota")]
    QuotaExceeded { key: String, size: usize, limit: usize },
    #[error("cache lock poisoned")]
    Poisoned,
}

pub struct UiCache {
    entries: Mutex<SizedCache<String, String>>,
    max_value_bytes: usize,
}

impl std::fmt::Debug for UiCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiCache")
            .field("max_value_bytes", &self.max_value_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for UiCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES, DEFAULT_MAX_VALUE_BYTES)
    }
}

impl UiCache {
    /// Least recently used entries are evicted past `capacity`.
    pub fn new(capacity: usize, max_value_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(SizedCache::with_size(capacity.max(1))),
            max_value_bytes,
        }
    }

    /// Store `value` under `key`. Returns `false` when the value was not stored.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_save(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("UI cache write skipped: {}", e);
                false
            }
        }
    }

    fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        if encoded.len() > self.max_value_bytes {
            return Err(CacheError::QuotaExceeded {
                key: key.to_string(),
                size: encoded.len(),
                limit: self.max_value_bytes,
            });
        }
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.cache_set(key.to_string(), encoded);
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("UI cache read treated as a miss: {}", e);
                None
            }
        }
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw = {
            let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
            match entries.cache_get(key) {
                Some(raw) => raw.clone(),
                None => return Ok(None),
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => entries.cache_remove(key).is_some(),
            Err(_) => false,
        }
    }
}
