//! In-memory local cache with optional JSON file persistence.

use std::{
    collections::BTreeMap,
    path::Path,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::{CacheError, LocalCache};

/// The current persistence file format version.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_persistence_version<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported cache file version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
struct CacheSnapshot {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    items: BTreeMap<String, String>,
}

/// A `HashMap`-style cache held in memory.
///
/// Used both as the tenant/registry cache and as the per-context session
/// store. The whole cache can be saved to and loaded from a JSON file.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    items: RwLock<BTreeMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }

    /// All keys currently stored, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Save the cache to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let snapshot = CacheSnapshot {
            version: PERSISTENCE_VERSION,
            items: self.read().clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|source| CacheError::InvalidFile { source })?;
        std::fs::write(path.as_ref(), json).map_err(|source| CacheError::FileIo { source })?;
        debug!(path = %path.as_ref().display(), items = snapshot.items.len(), "Saved cache");
        Ok(())
    }

    /// Load a cache from a JSON file. A missing file yields an empty cache.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => return Err(CacheError::FileIo { source }),
        };
        let snapshot: CacheSnapshot =
            serde_json::from_str(&json).map_err(|source| CacheError::InvalidFile { source })?;
        Ok(Self {
            items: RwLock::new(snapshot.items),
        })
    }
}

impl LocalCache for InMemoryCache {
    fn get_item(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        self.write().insert(key.to_string(), value);
    }

    fn remove_item(&self, key: &str) {
        self.write().remove(key);
    }
}
