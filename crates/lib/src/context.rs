//! Per-context state: the active tenant scope, the session and the working copy.
//!
//! A [`TenantContext`] is the equivalent of one browsing context. It owns
//! one session, one active tenant scope and one in-memory working copy of
//! that scope's [`TenantAppData`]. Every read or write the context performs
//! is addressed through the active scope, and switching scope reloads the
//! working copy from the local cache before anything else touches it.
//!
//! The session is persisted in a context-scoped store (a fresh
//! [`InMemoryCache`] by default), so it lives exactly as long as the context.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::{
    Result,
    cache::{InMemoryCache, LocalCache, LocalCacheExt},
    constants::SESSION_KEY,
    directory::UserDirectory,
    keys::TenantScope,
    model::{Session, SessionRole, TenantAppData},
    permissions::{Action, Module, PermissionEngine, PermissionError, PermissionOverrides, Role, RoleMatrix},
    realtime::{OnUpdate, RealtimeChannel, merge_snapshot},
    session::SessionManager,
    sync::SyncCoordinator,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// The shared in-memory copy of the active tenant document.
#[derive(Debug, Clone, Default)]
pub struct WorkingCopy(Arc<Mutex<TenantAppData>>);

impl WorkingCopy {
    pub fn new(doc: TenantAppData) -> Self {
        Self(Arc::new(Mutex::new(doc)))
    }

    /// A copy of the current document.
    pub fn get(&self) -> TenantAppData {
        lock(&self.0).clone()
    }

    pub fn replace(&self, doc: TenantAppData) {
        *lock(&self.0) = doc;
    }

    /// Mutate the document in place, returning the closure's result and a
    /// copy of the updated document.
    pub fn update<R>(&self, f: impl FnOnce(&mut TenantAppData) -> R) -> (R, TenantAppData) {
        let mut doc = lock(&self.0);
        let out = f(&mut doc);
        (out, doc.clone())
    }

    /// Apply a realtime snapshot atomically and return the result.
    pub(crate) fn apply_snapshot(&self, incoming: TenantAppData) -> TenantAppData {
        let mut doc = lock(&self.0);
        let next = merge_snapshot(&doc, incoming);
        *doc = next;
        doc.clone()
    }
}

/// One logical actor's view of the system.
pub struct TenantContext {
    sync: SyncCoordinator,
    session_store: Arc<dyn LocalCache>,
    scope: Mutex<TenantScope>,
    session: Mutex<Option<Session>>,
    working: WorkingCopy,
    realtime: RealtimeChannel,
    on_update: Mutex<Option<OnUpdate>>,
}

impl std::fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantContext")
            .field("scope", &self.scope())
            .field("session", &self.session())
            .field("realtime", &self.realtime)
            .finish_non_exhaustive()
    }
}

impl TenantContext {
    /// A logged-out context scoped to the host, with a private session store.
    pub fn new(sync: SyncCoordinator) -> Self {
        Self::with_session_store(sync, Arc::new(InMemoryCache::new()))
    }

    /// A logged-out context persisting its session in `session_store`.
    pub fn with_session_store(sync: SyncCoordinator, session_store: Arc<dyn LocalCache>) -> Self {
        let ctx = Self {
            sync,
            session_store,
            scope: Mutex::new(TenantScope::host()),
            session: Mutex::new(None),
            working: WorkingCopy::default(),
            realtime: RealtimeChannel::new(),
            on_update: Mutex::new(None),
        };
        ctx.reload_local();
        ctx
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// Login, impersonation and logout for this context.
    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(self)
    }

    /// Sub-users of the active tenant.
    pub fn users(&self) -> UserDirectory<'_> {
        UserDirectory::new(self)
    }

    // === Scope ===

    /// The active tenant scope.
    pub fn scope(&self) -> TenantScope {
        lock(&self.scope).clone()
    }

    /// Switch the active scope and reload the working copy from the cache.
    ///
    /// `None`, empty or `HOST` selects the host scope.
    pub fn activate_scope(&self, code: Option<&str>) -> TenantScope {
        let scope = match code {
            Some(code) => TenantScope::tenant(code),
            None => TenantScope::host(),
        };
        *lock(&self.scope) = scope.clone();
        self.reload_local();
        debug!(tenant = %scope, key = scope.storage_key(), "Activated tenant scope");
        scope
    }

    /// Point the context back at `scope` with `doc` as its working copy,
    /// without reading storage.
    pub(crate) fn restore_scope(&self, scope: TenantScope, doc: TenantAppData) {
        debug!(tenant = %scope, "Restored tenant scope");
        *lock(&self.scope) = scope;
        self.working.replace(doc);
    }

    fn reload_local(&self) {
        let scope = self.scope();
        let doc = match self.sync.load_local(&scope) {
            Ok(doc) => doc.unwrap_or_default(),
            Err(e) => {
                warn!(tenant = %scope, error = %e, "Cached document unreadable, starting empty");
                TenantAppData::default()
            }
        };
        self.working.replace(doc);
    }

    // === Working copy ===

    /// A copy of the active document.
    pub fn document(&self) -> TenantAppData {
        self.working.get()
    }

    pub fn working_copy(&self) -> &WorkingCopy {
        &self.working
    }

    /// Replace the working copy and save it.
    pub fn replace_document(&self, doc: TenantAppData) -> Result<()> {
        self.working.replace(doc.clone());
        self.sync.save(&self.scope(), &doc)?;
        Ok(())
    }

    /// Mutate the working copy and save the result.
    pub fn update<R>(&self, f: impl FnOnce(&mut TenantAppData) -> R) -> Result<R> {
        let (out, doc) = self.working.update(f);
        self.sync.save(&self.scope(), &doc)?;
        Ok(out)
    }

    /// Save the working copy as it stands.
    pub fn save(&self) -> Result<()> {
        self.sync.save(&self.scope(), &self.working.get())?;
        Ok(())
    }

    /// Pull the active document (remote preferred) into the working copy.
    pub async fn reload(&self) -> Result<TenantAppData> {
        let scope = self.scope();
        let doc = self.sync.load(&scope).await?.unwrap_or_default();
        self.working.replace(doc.clone());
        Ok(doc)
    }

    // === Session ===

    pub fn session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    /// Role of the current session, if logged in.
    pub fn role(&self) -> Option<SessionRole> {
        lock(&self.session).as_ref().map(|s| s.role)
    }

    pub(crate) fn set_session(&self, session: Option<Session>) -> Result<()> {
        match &session {
            Some(s) => self.session_store.set_document(SESSION_KEY, s)?,
            None => self.session_store.remove_item(SESSION_KEY),
        }
        *lock(&self.session) = session;
        Ok(())
    }

    /// Read back a session persisted earlier in this context and re-activate
    /// its scope. Returns `None` if the context never logged in.
    pub(crate) fn restore_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.session_store.get_document::<Session>(SESSION_KEY)? else {
            return Ok(None);
        };
        self.activate_scope(Some(&session.tenant_code));
        *lock(&self.session) = Some(session.clone());
        info!(tenant = %session.tenant_code, role = %session.role, "Restored session");
        Ok(Some(session))
    }

    // === Permissions ===

    /// Whether the current actor may perform `action` on `module`.
    ///
    /// Logged-out contexts are treated as viewers.
    pub fn can(&self, action: Action, module: Module) -> bool {
        let role = self.role().unwrap_or(SessionRole::Viewer);
        let doc = self.working.get();
        PermissionEngine::new(doc.role_permissions.as_ref()).can(role, action, module)
    }

    /// Like [`can`](Self::can), but as a `Result`.
    pub fn require(&self, action: Action, module: Module) -> std::result::Result<(), PermissionError> {
        let role = self.role().unwrap_or(SessionRole::Viewer);
        let doc = self.working.get();
        PermissionEngine::new(doc.role_permissions.as_ref()).require(role, action, module)
    }

    /// The matrix in force for `role` in the active tenant.
    pub fn effective_permissions(&self, role: Role) -> RoleMatrix {
        let doc = self.working.get();
        PermissionEngine::new(doc.role_permissions.as_ref()).effective(role)
    }

    /// Store role customizations for the active tenant.
    ///
    /// Locked roles in `overrides` are dropped silently. Returns the roles
    /// that were stored.
    pub fn save_permissions(&self, overrides: PermissionOverrides) -> Result<Vec<Role>> {
        let (accepted, doc) = self.working.update(|doc| {
            let mut stored = doc.role_permissions.clone().unwrap_or_default();
            let accepted = stored.merge_from(overrides)?;
            doc.role_permissions = Some(stored);
            Ok::<_, PermissionError>(accepted)
        });
        let accepted = accepted?;
        self.sync.save(&self.scope(), &doc)?;
        info!(roles = ?accepted, "Saved role permissions");
        Ok(accepted)
    }

    // === Realtime ===

    /// Set the callback run after each applied realtime snapshot.
    ///
    /// Takes effect the next time realtime starts.
    pub fn on_update(&self, callback: OnUpdate) {
        *lock(&self.on_update) = Some(callback);
    }

    /// Subscribe to the active scope's remote document.
    ///
    /// Without a remote store this does nothing.
    pub async fn start_realtime(&self) -> Result<()> {
        let Some(remote) = self.sync.remote().cloned() else {
            return Ok(());
        };
        let callback = lock(&self.on_update).clone();
        self.realtime
            .subscribe(remote.as_ref(), self.scope(), self.working.clone(), callback)
            .await?;
        Ok(())
    }

    pub fn stop_realtime(&self) {
        self.realtime.unsubscribe();
    }

    pub fn realtime(&self) -> &RealtimeChannel {
        &self.realtime
    }
}
