//! Local cache tier.
//!
//! The local cache is the fast, always-available tier: a synchronous string
//! store addressed by derived storage keys (tenant documents) or fixed keys
//! (registry, session). Every application write lands here before any
//! remote operation is attempted, so it is the source of truth for
//! read-after-write within one context.

mod errors;
mod in_memory;

pub use errors::CacheError;
pub use in_memory::InMemoryCache;

use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

/// Synchronous key → string store.
///
/// Implementations must never fail on plain reads and writes.
pub trait LocalCache: Send + Sync + Debug {
    /// Get the raw value stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: String);

    /// Remove `key` if present.
    fn remove_item(&self, key: &str);
}

/// Typed JSON access on top of any [`LocalCache`].
pub trait LocalCacheExt: LocalCache {
    /// Decode the document under `key`, or `None` if nothing is stored.
    fn get_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_item(key) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| CacheError::CorruptDocument {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Encode `doc` and store it under `key`.
    fn set_document<T: Serialize + ?Sized>(&self, key: &str, doc: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(doc).map_err(|source| CacheError::EncodeFailed {
            key: key.to_string(),
            source,
        })?;
        self.set_item(key, raw);
        Ok(())
    }
}

impl<C: LocalCache + ?Sized> LocalCacheExt for C {}
