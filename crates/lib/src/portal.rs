//! Entry point tying the storage tiers together.
//!
//! A [`Portal`] is one deployment as seen from one device: a local cache, an
//! optional remote store and the [`SyncCoordinator`] between them. Contexts
//! opened from the same portal share the cache and the remote, and each
//! keeps its own session and active tenant scope.
//!
//! ## Example
//!
//! ```
//! # use std::sync::Arc;
//! # use transitpay::{Portal, HostLogin, cache::InMemoryCache, remote::InMemoryRemote, sync::SyncConfig};
//! # #[tokio::main]
//! # async fn main() -> transitpay::Result<()> {
//! let portal = Portal::open(
//!     Arc::new(InMemoryCache::new()),
//!     Some(Arc::new(InMemoryRemote::new())),
//!     SyncConfig::default(),
//! );
//! portal.tenants().seed_demo()?;
//!
//! let ctx = portal.open_context();
//! let session = ctx.sessions().login_tenant("demo", "0123456789").await?;
//! assert_eq!(session.tenant_code, "DEMO");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::{
    Clock, Result, SystemClock,
    cache::LocalCache,
    context::TenantContext,
    directory::TenantDirectory,
    model::Registry,
    remote::RemoteStore,
    sync::{SyncConfig, SyncCoordinator},
};

/// Cheap-to-clone handle over the shared storage tiers.
#[derive(Debug, Clone)]
pub struct Portal {
    sync: SyncCoordinator,
}

impl Portal {
    /// Open a portal using the system clock.
    ///
    /// Must be called inside a tokio runtime: the background push worker is
    /// spawned here.
    pub fn open(cache: Arc<dyn LocalCache>, remote: Option<Arc<dyn RemoteStore>>, config: SyncConfig) -> Self {
        Self::open_with_clock(cache, remote, Arc::new(SystemClock), config)
    }

    /// Open a portal with a custom time provider.
    pub fn open_with_clock(
        cache: Arc<dyn LocalCache>,
        remote: Option<Arc<dyn RemoteStore>>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            sync: SyncCoordinator::new(cache, remote, clock, config),
        }
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// A new logged-out context with its own session store.
    pub fn open_context(&self) -> TenantContext {
        TenantContext::new(self.sync.clone())
    }

    /// A new context persisting its session in `session_store`.
    ///
    /// Reusing a store lets a context [`restore`](crate::SessionManager::restore)
    /// the session of an earlier one.
    pub fn open_context_with_session_store(&self, session_store: Arc<dyn LocalCache>) -> TenantContext {
        TenantContext::with_session_store(self.sync.clone(), session_store)
    }

    /// Host tenant management.
    pub fn tenants(&self) -> TenantDirectory {
        TenantDirectory::new(self.sync.clone())
    }

    /// The cached registry (empty if none is cached).
    pub fn registry(&self) -> Result<Registry> {
        Ok(self.sync.load_registry()?)
    }

    /// Wait for all queued remote writes to be attempted.
    pub async fn flush(&self) -> Result<()> {
        self.sync.flush().await?;
        Ok(())
    }
}
