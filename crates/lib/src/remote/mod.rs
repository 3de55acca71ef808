//! Remote document store tier.
//!
//! The remote store is consumed as an opaque capability: documents addressed
//! by path, merge-writes, and change subscriptions. It may be slow, offline,
//! or briefly inconsistent; callers in [`crate::sync`] decide how much of
//! that to tolerate.
//!
//! Paths used by this crate are `tenants/{sanitizedCode}` for tenant data and
//! `config/registry` for the shared registry.

mod errors;
mod in_memory;
mod merge;

pub use errors::RemoteError;
pub use in_memory::InMemoryRemote;
pub use merge::deep_merge;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// One inbound change notification: the document as it now exists
/// (`None` if it was deleted), or a channel error.
pub type SnapshotEvent = Result<Option<Value>, RemoteError>;

/// Async document store capability.
#[async_trait]
pub trait RemoteStore: Send + Sync + Debug {
    /// Whether the remote channel is currently usable.
    async fn is_reachable(&self) -> bool;

    /// Fetch the document at `path`. `Ok(None)` means it does not exist.
    async fn get_document(&self, path: &str) -> Result<Option<Value>, RemoteError>;

    /// Merge `doc` into the document at `path`, creating it if absent.
    async fn set_document_merge(&self, path: &str, doc: Value) -> Result<(), RemoteError>;

    /// Delete the document at `path`. Deleting a missing document succeeds.
    async fn delete_document(&self, path: &str) -> Result<(), RemoteError>;

    /// Subscribe to changes of the document at `path`.
    ///
    /// The current state is delivered first, then every subsequent change.
    /// Channel errors are delivered in-band and do not end the stream.
    async fn subscribe(&self, path: &str) -> Result<Subscription, RemoteError>;
}

/// A restartable stream of snapshots for one document path.
///
/// Dropping the subscription detaches it from the store.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl Subscription {
    /// Wrap the receiving half of a snapshot channel.
    pub fn new(path: impl Into<String>, events: mpsc::UnboundedReceiver<SnapshotEvent>) -> Self {
        Self {
            path: path.into(),
            events,
        }
    }

    /// Path this subscription watches.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next event. `None` once the store has dropped the feed.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }
}
