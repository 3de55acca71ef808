//! Local/remote synchronization.
//!
//! [`SyncCoordinator`] owns the two storage tiers and the rules between them:
//!
//! - **Push**: [`save`](SyncCoordinator::save) writes the local cache first,
//!   then queues a merge-write on the background push worker. Push failures
//!   are logged, never surfaced and never retried; the next save carries the
//!   latest state anyway.
//! - **Pull**: [`load`](SyncCoordinator::load) prefers the remote document
//!   when the remote is reachable and overwrites the local entry with it,
//!   falling back to the local cache otherwise.
//! - **Migration**: [`migrate`](SyncCoordinator::migrate) copies a cached
//!   document to the remote tier once, stamping `_migrated`.
//! - **Registry convergence**: [`await_registry`](SyncCoordinator::await_registry)
//!   waits, within a bound, for the shared registry to reach this context.
//!
//! The coordinator is cheap to clone; clones share the same worker and state.
//! Constructing one spawns the push worker, so it must happen inside a Tokio
//! runtime.

mod config;
mod converge;
mod errors;
mod push;

pub use config::SyncConfig;
pub use errors::SyncError;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::Instant,
};
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use converge::{Probe, RegistryWait, converge};
use push::{PushCommand, PushWorker};

use crate::{
    Clock,
    cache::{LocalCache, LocalCacheExt},
    constants::{REGISTRY_KEY, REGISTRY_PATH},
    keys::TenantScope,
    model::{Registry, TenantAppData},
    remote::{RemoteError, RemoteStore, deep_merge},
};

/// An in-flight registry wait: how it ended once it has, and its deadline.
#[derive(Debug, Clone)]
struct SharedWait {
    outcome: watch::Receiver<Option<Probe>>,
    deadline: Instant,
}

type Waits = HashMap<RegistryWait, SharedWait>;

/// Coordinates the local cache and the remote store.
#[derive(Clone, Debug)]
pub struct SyncCoordinator {
    inner: Arc<SyncInner>,
}

#[derive(Debug)]
struct SyncInner {
    cache: Arc<dyn LocalCache>,
    remote: Option<Arc<dyn RemoteStore>>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    push_tx: Option<mpsc::UnboundedSender<PushCommand>>,
    /// Held while a registry fetch for a convergence wait is in flight.
    fetch_gate: tokio::sync::Mutex<()>,
    /// In-flight convergence waits, one per purpose.
    waits: Mutex<Waits>,
}

impl SyncCoordinator {
    /// Create a coordinator. Without a remote store every operation is
    /// local-only.
    pub fn new(
        cache: Arc<dyn LocalCache>,
        remote: Option<Arc<dyn RemoteStore>>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        let push_tx = remote.clone().map(PushWorker::start);
        Self {
            inner: Arc::new(SyncInner {
                cache,
                remote,
                clock,
                config,
                push_tx,
                fetch_gate: tokio::sync::Mutex::new(()),
                waits: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &Arc<dyn LocalCache> {
        &self.inner.cache
    }

    pub fn remote(&self) -> Option<&Arc<dyn RemoteStore>> {
        self.inner.remote.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    // === Tenant documents ===

    /// Write `doc` to the local cache, then queue a remote push.
    ///
    /// Only a failure to encode the document is reported.
    pub fn save(&self, scope: &TenantScope, doc: &TenantAppData) -> Result<(), SyncError> {
        self.inner.cache.set_document(scope.storage_key(), doc)?;
        trace!(tenant = %scope, "Saved document locally");
        self.push(scope.remote_path(), doc)
    }

    /// Read the cached document for `scope`.
    pub fn load_local(&self, scope: &TenantScope) -> Result<Option<TenantAppData>, SyncError> {
        Ok(self.inner.cache.get_document(scope.storage_key())?)
    }

    /// Load the document for `scope`, preferring the remote tier.
    ///
    /// A remote hit replaces the cached entry before returning. Remote
    /// failures and absence fall back to the cache silently.
    pub async fn load(&self, scope: &TenantScope) -> Result<Option<TenantAppData>, SyncError> {
        if self.is_remote_reachable().await {
            match self.fetch_remote(scope).await {
                Ok(Some(doc)) => {
                    self.inner.cache.set_document(scope.storage_key(), &doc)?;
                    debug!(tenant = %scope, "Loaded document from remote");
                    return Ok(Some(doc));
                }
                Ok(None) => debug!(tenant = %scope, "No remote document, using local cache"),
                Err(e) => warn!(tenant = %scope, error = %e, "Remote load failed, using local cache"),
            }
        }
        self.load_local(scope)
    }

    /// Fetch the remote document for `scope` without touching the cache.
    pub async fn fetch_remote(&self, scope: &TenantScope) -> Result<Option<TenantAppData>, SyncError> {
        let path = scope.remote_path();
        match self.fetch(path).await? {
            Some(value) => decode(path, value).map(Some),
            None => Ok(None),
        }
    }

    /// Copy the cached document for `scope` to the remote tier once.
    ///
    /// Returns `Ok(true)` if a copy was made. A remote document already
    /// stamped `_migrated` is left alone, as is a scope with nothing cached.
    pub async fn migrate(&self, scope: &TenantScope) -> Result<bool, SyncError> {
        self.migrate_path(scope.storage_key(), scope.remote_path())
            .instrument(info_span!("migrate", tenant = %scope))
            .await
    }

    /// Remove the document for `scope` from both tiers.
    pub fn remove(&self, scope: &TenantScope) {
        self.inner.cache.remove_item(scope.storage_key());
        debug!(tenant = %scope, "Removed local document");
        self.send(PushCommand::Delete {
            path: scope.remote_path().to_string(),
        });
    }

    /// Move the document stored under `from` to `to` in both tiers.
    ///
    /// Each tier writes the new location before deleting the old one, so an
    /// interruption leaves the old document in place. Queued pushes are
    /// flushed first so none of them lands on the old path afterwards.
    pub async fn move_document(&self, from: &TenantScope, to: &TenantScope) -> Result<(), SyncError> {
        if let Some(raw) = self.inner.cache.get_item(from.storage_key()) {
            self.inner.cache.set_item(to.storage_key(), raw);
            self.inner.cache.remove_item(from.storage_key());
            info!(from = %from, to = %to, "Moved local document");
        }

        let Some(remote) = self.inner.remote.clone() else {
            return Ok(());
        };
        self.flush().await?;
        if let Some(doc) = self.fetch(from.remote_path()).await? {
            remote.set_document_merge(to.remote_path(), doc).await?;
            remote.delete_document(from.remote_path()).await?;
            info!(from = %from, to = %to, "Moved remote document");
        }
        Ok(())
    }

    // === Registry ===

    /// The cached registry, if one has ever been stored.
    pub fn registry_local(&self) -> Result<Option<Registry>, SyncError> {
        Ok(self.inner.cache.get_document(REGISTRY_KEY)?)
    }

    /// The cached registry, or an empty one.
    pub fn load_registry(&self) -> Result<Registry, SyncError> {
        Ok(self.registry_local()?.unwrap_or_default())
    }

    /// Write the registry locally and queue a remote push.
    pub fn save_registry(&self, registry: &Registry) -> Result<(), SyncError> {
        self.inner.cache.set_document(REGISTRY_KEY, registry)?;
        debug!(tenants = registry.tenants.len(), "Saved registry locally");
        self.push(REGISTRY_PATH, registry)
    }

    /// Fetch the remote registry and merge it into the cache.
    ///
    /// Remote fields win; arrays (the tenant list) are replaced wholesale.
    /// Returns the merged registry, or `None` if the remote has none yet.
    pub async fn pull_registry(&self) -> Result<Option<Registry>, SyncError> {
        self.flush().await?;
        let Some(fetched) = self.fetch(REGISTRY_PATH).await? else {
            return Ok(None);
        };
        let mut merged = match self.inner.cache.get_document::<Value>(REGISTRY_KEY) {
            Ok(local) => local.unwrap_or(Value::Null),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cached registry");
                Value::Null
            }
        };
        deep_merge(&mut merged, fetched);
        let registry: Registry = decode(REGISTRY_PATH, merged)?;
        self.inner.cache.set_document(REGISTRY_KEY, &registry)?;
        debug!(tenants = registry.tenants.len(), "Merged remote registry");
        Ok(Some(registry))
    }

    /// Copy the cached registry to the remote tier once.
    pub async fn migrate_registry(&self) -> Result<bool, SyncError> {
        self.migrate_path(REGISTRY_KEY, REGISTRY_PATH)
            .instrument(info_span!("migrate_registry"))
            .await
    }

    /// Wait up to `timeout` for the registry to reach this context.
    ///
    /// With `required` set, waits for that tenant code (case-insensitive) to
    /// be listed; otherwise for any registry document. A `false` result
    /// means "not seen yet", not "does not exist".
    ///
    /// Concurrent calls waiting for the same thing share one retry loop. A
    /// caller whose deadline outlives that loop keeps polling on its own.
    pub async fn await_registry(&self, timeout: Duration, required: Option<&str>) -> bool {
        let wait = RegistryWait::new(required);
        if self.inner.remote.is_none() {
            return self.registry_satisfies(&wait);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let SharedWait {
                outcome: mut rx,
                deadline: ends,
            } = self.join_wait(wait.clone(), deadline);
            let outcome = match tokio::time::timeout_at(deadline, rx.wait_for(Option::is_some)).await {
                Ok(Ok(outcome)) => *outcome,
                _ => None,
            };
            if outcome == Some(Probe::Satisfied) || self.registry_satisfies(&wait) {
                return true;
            }
            // Only a loop that ran out of time early is worth following up.
            if outcome != Some(Probe::Pending) || ends >= deadline || Instant::now() >= deadline {
                return false;
            }
            debug!(?wait, "Shared registry wait expired early, continuing");
        }
    }

    /// Wait until every queued remote push has been attempted.
    pub async fn flush(&self) -> Result<(), SyncError> {
        let Some(tx) = &self.inner.push_tx else {
            return Ok(());
        };
        let (response, done) = oneshot::channel();
        tx.send(PushCommand::Flush { response })
            .map_err(|_| SyncError::WorkerStopped)?;
        done.await.map_err(|_| SyncError::WorkerStopped)
    }

    // === Internals ===

    async fn is_remote_reachable(&self) -> bool {
        match &self.inner.remote {
            Some(remote) => remote.is_reachable().await,
            None => false,
        }
    }

    async fn fetch(&self, path: &str) -> Result<Option<Value>, SyncError> {
        let remote = self.inner.remote.as_ref().ok_or(SyncError::NoRemote)?;
        match tokio::time::timeout(self.inner.config.fetch_timeout, remote.get_document(path)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RemoteError::Timeout {
                path: path.to_string(),
            }
            .into()),
        }
    }

    fn push<T: Serialize + ?Sized>(&self, path: &str, doc: &T) -> Result<(), SyncError> {
        if self.inner.push_tx.is_none() {
            return Ok(());
        }
        let doc = serde_json::to_value(doc).map_err(|source| SyncError::InvalidDocument {
            path: path.to_string(),
            source,
        })?;
        self.send(PushCommand::Push {
            path: path.to_string(),
            doc,
        });
        Ok(())
    }

    fn send(&self, cmd: PushCommand) {
        if let Some(tx) = &self.inner.push_tx
            && let Err(e) = tx.send(cmd)
        {
            error!(command = ?e.0, "Push worker stopped, change kept locally only");
        }
    }

    async fn migrate_path(&self, key: &str, path: &str) -> Result<bool, SyncError> {
        let Some(remote) = self.inner.remote.clone() else {
            return Ok(false);
        };
        let Some(mut local) = self.inner.cache.get_document::<Value>(key)? else {
            debug!("Nothing cached to migrate");
            return Ok(false);
        };
        if let Some(existing) = self.fetch(path).await?
            && existing.get("_migrated").and_then(Value::as_bool) == Some(true)
        {
            debug!("Remote document already migrated");
            return Ok(false);
        }
        if let Value::Object(fields) = &mut local {
            fields.insert("_migrated".into(), Value::Bool(true));
            fields.insert("_migratedAt".into(), Value::String(self.inner.clock.timestamp()));
        }
        remote.set_document_merge(path, local).await?;
        info!(path, "Migrated cached document to remote");
        Ok(true)
    }

    fn registry_satisfies(&self, wait: &RegistryWait) -> bool {
        match self.registry_local() {
            Ok(registry) => wait.is_satisfied(registry.as_ref()),
            Err(e) => {
                warn!(error = %e, "Cached registry unreadable");
                false
            }
        }
    }

    fn waits(&self) -> std::sync::MutexGuard<'_, Waits> {
        self.inner.waits.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Join the in-flight wait for `wait`, or start one ending at `deadline`.
    fn join_wait(&self, wait: RegistryWait, deadline: Instant) -> SharedWait {
        let mut waits = self.waits();
        if let Some(shared) = waits.get(&wait) {
            debug!(?wait, "Joining in-flight registry wait");
            return shared.clone();
        }
        let (tx, rx) = watch::channel(None);
        let shared = SharedWait { outcome: rx, deadline };
        waits.insert(wait.clone(), shared.clone());
        drop(waits);

        let this = self.clone();
        let span = info_span!("await_registry", ?wait);
        tokio::spawn(
            async move {
                let outcome = this.converge_registry(&wait, deadline).await;
                this.waits().remove(&wait);
                debug!(?outcome, "Registry wait finished");
                let _ = tx.send(Some(outcome));
            }
            .instrument(span),
        );
        shared
    }

    async fn converge_registry(&self, wait: &RegistryWait, deadline: Instant) -> Probe {
        let Some(remote) = self.inner.remote.clone() else {
            return self.cached_outcome(wait, Probe::Degraded);
        };
        let config = &self.inner.config;
        let start = Instant::now();

        let reachable = converge(
            deadline.min(start + config.reachability_timeout),
            config.reachability_poll,
            || {
                let remote = remote.clone();
                async move {
                    if remote.is_reachable().await {
                        Probe::Satisfied
                    } else {
                        Probe::Pending
                    }
                }
            },
        )
        .await;
        if reachable != Probe::Satisfied {
            warn!("Remote store unreachable, using cached registry");
            return self.cached_outcome(wait, Probe::Degraded);
        }

        let mut initial = true;
        let outcome = converge(deadline, config.poll_interval, || {
            let this = self.clone();
            let remote = remote.clone();
            let wait = wait.clone();
            let first = std::mem::replace(&mut initial, false);
            async move {
                if !first && !remote.is_reachable().await {
                    warn!("Remote store went away while waiting for registry");
                    return Probe::Degraded;
                }
                this.refresh_registry(first).await;
                if this.registry_satisfies(&wait) {
                    Probe::Satisfied
                } else {
                    Probe::Pending
                }
            }
        })
        .await;
        self.cached_outcome(wait, outcome)
    }

    /// `Satisfied` if the cached registry already satisfies `wait`, else `otherwise`.
    fn cached_outcome(&self, wait: &RegistryWait, otherwise: Probe) -> Probe {
        if self.registry_satisfies(wait) {
            Probe::Satisfied
        } else {
            otherwise
        }
    }

    /// Fetch and merge the registry unless another wait is already doing so.
    ///
    /// With `join_in_flight`, a busy fetch is awaited instead of skipped.
    async fn refresh_registry(&self, join_in_flight: bool) {
        let _guard = match self.inner.fetch_gate.try_lock() {
            Ok(guard) => guard,
            Err(_) if join_in_flight => {
                let _ = self.inner.fetch_gate.lock().await;
                return;
            }
            Err(_) => {
                trace!("Registry fetch already in flight, skipping");
                return;
            }
        };
        if let Err(e) = self.pull_registry().await {
            warn!(error = %e, "Registry fetch failed");
        }
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, SyncError> {
    serde_json::from_value(value).map_err(|source| SyncError::InvalidDocument {
        path: path.to_string(),
        source,
    })
}
