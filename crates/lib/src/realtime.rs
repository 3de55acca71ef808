//! Live updates for the active tenant document.
//!
//! A [`RealtimeChannel`] holds at most one remote subscription. Each inbound
//! snapshot replaces the context's working copy, except that a non-null
//! `user` already in the working copy is kept: a remote write racing with
//! a local login must not log the current actor out.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::{
    context::WorkingCopy,
    keys::TenantScope,
    model::TenantAppData,
    remote::{RemoteError, RemoteStore, Subscription},
};

/// Called with the new working copy after every applied snapshot.
///
/// Runs while the channel's delivery lock is held, so it must not call
/// [`RealtimeChannel::unsubscribe`].
pub type OnUpdate = Arc<dyn Fn(&TenantAppData) + Send + Sync>;

/// Fold an incoming snapshot into the current working copy.
pub fn merge_snapshot(current: &TenantAppData, incoming: TenantAppData) -> TenantAppData {
    let mut next = incoming;
    if current.user.is_some() {
        next.user = current.user.clone();
    }
    next
}

/// At most one live subscription per context.
#[derive(Debug, Default)]
pub struct RealtimeChannel {
    current: Mutex<Option<ActiveSubscription>>,
}

#[derive(Debug)]
struct ActiveSubscription {
    scope: TenantScope,
    /// Delivery lock; `false` once unsubscribed.
    live: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    fn stop(self) {
        *lock(&self.live) = false;
        self.task.abort();
        info!(tenant = %self.scope, "Realtime subscription stopped");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl RealtimeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `scope`'s remote document, replacing any prior subscription.
    pub async fn subscribe(
        &self,
        remote: &dyn RemoteStore,
        scope: TenantScope,
        working: WorkingCopy,
        on_update: Option<OnUpdate>,
    ) -> Result<(), RemoteError> {
        self.unsubscribe();
        let subscription = remote.subscribe(scope.remote_path()).await?;
        let live = Arc::new(Mutex::new(true));
        let task = tokio::spawn(
            deliver(subscription, working, on_update, live.clone())
                .instrument(info_span!("realtime", tenant = %scope)),
        );
        info!(tenant = %scope, "Realtime subscription started");
        let previous = lock(&self.current).replace(ActiveSubscription { scope, live, task });
        // A concurrent subscribe may have slipped in while we awaited.
        if let Some(previous) = previous {
            previous.stop();
        }
        Ok(())
    }

    /// Stop the active subscription. No callback runs after this returns.
    pub fn unsubscribe(&self) {
        let current = lock(&self.current).take();
        if let Some(current) = current {
            current.stop();
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.current).is_some()
    }

    /// Scope of the active subscription.
    pub fn scope(&self) -> Option<TenantScope> {
        lock(&self.current).as_ref().map(|s| s.scope.clone())
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn deliver(
    mut subscription: Subscription,
    working: WorkingCopy,
    on_update: Option<OnUpdate>,
    live: Arc<Mutex<bool>>,
) {
    while let Some(event) = subscription.next().await {
        let incoming = match event {
            Ok(Some(value)) => match serde_json::from_value::<TenantAppData>(value) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed snapshot");
                    continue;
                }
            },
            Ok(None) => {
                trace!("Remote document absent");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Realtime channel error");
                continue;
            }
        };

        {
            let live = lock(&live);
            if !*live {
                break;
            }
            let applied = working.apply_snapshot(incoming);
            if let Some(callback) = &on_update {
                callback(&applied);
            }
        }
        debug!(path = subscription.path(), "Applied realtime snapshot");
    }
    debug!("Realtime feed closed");
}
