//! In-process remote store.
//!
//! Behaves like a merge-write document store with change feeds, and lets
//! callers simulate the unreliable parts: latency, going offline, one-off
//! failures, and writes made by other devices.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, trace};

use super::{RemoteError, RemoteStore, SnapshotEvent, Subscription, deep_merge};

type Subscribers = HashMap<String, Vec<mpsc::UnboundedSender<SnapshotEvent>>>;

/// Remote store kept in memory.
#[derive(Debug)]
pub struct InMemoryRemote {
    documents: RwLock<BTreeMap<String, Value>>,
    subscribers: Mutex<Subscribers>,
    online: AtomicBool,
    latency_ms: AtomicU64,
    fail_next: AtomicUsize,
    fetches: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::with_documents(BTreeMap::new())
    }
}

impl InMemoryRemote {
    /// An empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// An online store pre-populated with `documents`.
    pub fn with_documents(documents: BTreeMap<String, Value>) -> Self {
        Self {
            documents: RwLock::new(documents),
            subscribers: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            fail_next: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the store online or offline.
    pub fn set_online(&self, online: bool) {
        debug!(online, "Remote store availability changed");
        self.online.store(online, Ordering::SeqCst);
    }

    /// Delay applied before every operation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make the next `count` operations fail with a transport error.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Number of `get_document` calls served or attempted.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `set_document_merge` calls served or attempted.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read a document directly, bypassing availability simulation.
    pub async fn peek(&self, path: &str) -> Option<Value> {
        self.documents.read().await.get(path).cloned()
    }

    /// Replace a document as another device would, notifying subscribers.
    ///
    /// Works even while the store is offline for this client.
    pub async fn put_external(&self, path: &str, doc: Value) {
        self.documents
            .write()
            .await
            .insert(path.to_string(), doc.clone());
        self.notify(path, Ok(Some(doc)));
    }

    /// Push a channel error to every subscriber of `path`.
    pub fn inject_channel_error(&self, path: &str, error: RemoteError) {
        self.notify(path, Err(error));
    }

    /// Copy of every stored document.
    pub async fn snapshot(&self) -> BTreeMap<String, Value> {
        self.documents.read().await.clone()
    }

    /// Save all documents to a JSON file.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot().await)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load documents from a JSON file. A missing file yields an empty store.
    pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(Self::with_documents(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn notify(&self, path: &str, event: SnapshotEvent) {
        let mut subscribers = self.subscribers();
        if let Some(senders) = subscribers.get_mut(path) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            trace!(path, live = senders.len(), "Notified subscribers");
        }
    }

    /// Apply latency, availability and injected failures for one operation.
    async fn enter(&self, path: &str) -> Result<(), RemoteError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable {
                path: path.to_string(),
            });
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(RemoteError::Transport(format!(
                "injected failure on '{path}'"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn is_reachable(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn get_document(&self, path: &str) -> Result<Option<Value>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.enter(path).await?;
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn set_document_merge(&self, path: &str, doc: Value) -> Result<(), RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.enter(path).await?;
        let merged = {
            let mut documents = self.documents.write().await;
            let entry = documents.entry(path.to_string()).or_insert(Value::Null);
            deep_merge(entry, doc);
            entry.clone()
        };
        self.notify(path, Ok(Some(merged)));
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), RemoteError> {
        self.enter(path).await?;
        let removed = self.documents.write().await.remove(path).is_some();
        if removed {
            self.notify(path, Ok(None));
        }
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, RemoteError> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Registering under the read lock keeps writers out until the
        // initial state is queued ahead of any later change.
        let documents = self.documents.read().await;
        let _ = tx.send(Ok(documents.get(path).cloned()));
        self.subscribers()
            .entry(path.to_string())
            .or_default()
            .push(tx);
        drop(documents);
        debug!(path, "Remote subscription opened");
        Ok(Subscription::new(path, rx))
    }
}
