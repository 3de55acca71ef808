//! Login, impersonation and logout.
//!
//! A context is in one of four states: logged out, host, tenant (owner or
//! sub-user), or host viewing a tenant. [`SessionManager`] performs the
//! transitions between them:
//!
//! - [`login_host`](SessionManager::login_host): claims the host account on
//!   first run, otherwise requires the registered phone.
//! - [`login_tenant`](SessionManager::login_tenant): waits for the registry
//!   to converge, falls back to discovering the tenant from its document,
//!   then matches the phone against the tenant and its sub-users.
//! - [`view_tenant`](SessionManager::view_tenant) and
//!   [`return_to_host`](SessionManager::return_to_host): host impersonation.
//! - [`logout`](SessionManager::logout).
//!
//! Every successful login migrates the active tenant's cached document to
//! the remote tier (once) and starts the realtime subscription for it.

mod discovery;
mod errors;

pub use errors::SessionError;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    constants::{DEMO_PHONE, HOST_CODE, LEGACY_DEMO_PHONE, MIN_PHONE_INPUT_LEN},
    context::TenantContext,
    keys::{TenantScope, validate_code},
    model::{ActiveUser, HostAccount, Registry, Session, SessionKind, SessionRole, Tenant, TenantAppData},
    phone::{normalize_phone, phones_match},
};

/// Input for a host login.
#[derive(Debug, Clone, Default)]
pub struct HostLogin {
    pub phone: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub hostname: Option<String>,
}

impl HostLogin {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Session transitions for one [`TenantContext`].
#[derive(Debug, Clone, Copy)]
pub struct SessionManager<'a> {
    ctx: &'a TenantContext,
}

/// Reject empty or too-short phone input before touching any storage.
fn check_phone(raw: &str) -> Result<String, SessionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SessionError::MissingPhone);
    }
    if raw.chars().count() < MIN_PHONE_INPUT_LEN {
        return Err(SessionError::PhoneTooShort);
    }
    Ok(normalize_phone(raw))
}

fn is_placeholder_host(phone: &str) -> bool {
    phones_match(phone, DEMO_PHONE) || phones_match(phone, LEGACY_DEMO_PHONE)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Who a tenant login resolved to.
struct Resolved {
    tenant: Tenant,
    name: String,
    role: SessionRole,
    /// The tenant document, if the sub-user scan already loaded it.
    doc: Option<TenantAppData>,
}

impl<'a> SessionManager<'a> {
    pub fn new(ctx: &'a TenantContext) -> Self {
        Self { ctx }
    }

    /// Log in as the host operator.
    pub async fn login_host(&self, login: HostLogin) -> Result<Session, SessionError> {
        let phone = check_phone(&login.phone)?;
        self.claim_host(login, phone)
            .instrument(info_span!("login_host"))
            .await
    }

    async fn claim_host(&self, login: HostLogin, phone: String) -> Result<Session, SessionError> {
        let sync = self.ctx.sync();
        let converged = sync.await_registry(sync.config().registry_timeout, None).await;
        debug!(converged, "Registry wait finished");

        let mut registry = sync.load_registry()?;
        let previous = registry.host.clone();
        if let Some(existing) = &previous
            && !phones_match(&existing.phone, &phone)
            && !is_placeholder_host(&existing.phone)
        {
            return Err(SessionError::HostPhoneMismatch);
        }

        let now = sync.clock().timestamp();
        let name = non_empty(login.name)
            .or_else(|| previous.as_ref().map(|h| h.name.clone()))
            .unwrap_or_else(|| "System Admin".to_string());
        let created_at = previous
            .as_ref()
            .map(|h| h.created_at.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| now.clone());
        let host = HostAccount {
            phone: phone.clone(),
            name,
            username: non_empty(login.username),
            hostname: non_empty(login.hostname),
            created_at,
            updated_at: Some(now.clone()),
        };
        if previous.is_none() {
            info!(phone = %phone, "Claiming host account");
        }
        registry.host = Some(host.clone());
        sync.save_registry(&registry)?;

        let session = host_session(&host, now);
        self.enter(session.clone(), TenantScope::host(), None).await?;
        info!(name = %session.name, "Host logged in");
        Ok(session)
    }

    /// Log in to a tenant as its owner or one of its sub-users.
    pub async fn login_tenant(&self, code: &str, phone: &str) -> Result<Session, SessionError> {
        let phone = check_phone(phone)?;
        let code = validate_code(code)?;
        // Resolution scopes the context to the candidate code; a refused
        // login must hand the current session its scope back.
        let previous = self
            .ctx
            .session()
            .map(|_| (self.ctx.scope(), self.ctx.document(), self.ctx.realtime().is_active()));
        let span = info_span!("login_tenant", tenant = %code);
        let result = self.open_tenant(&code, phone).instrument(span).await;
        if let Err(e) = &result {
            info!(tenant = %code, reason = %e, "Tenant login refused");
            match previous {
                Some((scope, doc, realtime)) => self.resume(scope, doc, realtime).await,
                None => {
                    self.ctx.activate_scope(None);
                }
            }
        }
        result
    }

    /// Put a still-logged-in context back on `scope` after a refused login.
    async fn resume(&self, scope: TenantScope, doc: TenantAppData, realtime: bool) {
        let moved = self.ctx.scope() != scope;
        self.ctx.restore_scope(scope.clone(), doc);
        // Snapshots delivered while scoped elsewhere were dropped with the
        // borrowed working copy; a fresh subscription replays the latest.
        if realtime
            && (moved || !self.ctx.realtime().is_active())
            && let Err(e) = self.ctx.start_realtime().await
        {
            warn!(tenant = %scope, error = %e, "Realtime subscription failed");
        }
    }

    async fn open_tenant(&self, code: &str, phone: String) -> Result<Session, SessionError> {
        let resolved = self.resolve_tenant_login(code, &phone).await?;
        let session = Session {
            kind: SessionKind::Tenant,
            tenant_code: code.to_string(),
            tenant_id: Some(resolved.tenant.id.clone()),
            tenant_name: Some(resolved.tenant.name.clone()),
            name: resolved.name,
            role: resolved.role,
            phone,
            username: None,
            hostname: None,
            login_time: self.ctx.sync().clock().timestamp(),
            original_session: None,
        };
        self.enter(session.clone(), TenantScope::tenant(code), resolved.doc)
            .await?;
        info!(
            role = %session.role,
            discovered = resolved.tenant.is_discovered,
            "Tenant logged in"
        );
        Ok(session)
    }

    async fn resolve_tenant_login(&self, code: &str, phone: &str) -> Result<Resolved, SessionError> {
        let tenant = self.resolve_tenant(code).await?;
        if !tenant.status.is_active() {
            return Err(SessionError::TenantSuspended { code: code.to_string() });
        }
        if phones_match(&tenant.phone, phone) {
            return Ok(Resolved {
                name: tenant.name.clone(),
                tenant,
                role: SessionRole::Tenant,
                doc: None,
            });
        }

        debug!("Primary phone mismatch, checking sub-users");
        let scope = self.ctx.activate_scope(Some(code));
        let doc = self.ctx.sync().load(&scope).await?;
        let Some(user) = doc.as_ref().and_then(|d| d.find_user_by_phone(phone)).cloned() else {
            return Err(SessionError::PhoneMismatch { code: code.to_string() });
        };
        if !user.status.is_active() {
            return Err(SessionError::SubUserSuspended {
                code: code.to_string(),
                name: user.name,
            });
        }
        Ok(Resolved {
            tenant,
            name: user.name,
            role: user.role.into(),
            doc,
        })
    }

    /// Find `code` in the converged registry, or discover it from its document.
    async fn resolve_tenant(&self, code: &str) -> Result<Tenant, SessionError> {
        let sync = self.ctx.sync();
        let converged = sync
            .await_registry(sync.config().registry_timeout, Some(code))
            .await;
        debug!(converged, "Registry wait finished");

        if let Some(tenant) = sync.load_registry()?.find_tenant(code) {
            return Ok(tenant.clone());
        }
        if sync.remote().is_none() {
            return Err(SessionError::UnknownTenant { code: code.to_string() });
        }
        discovery::discover(self.ctx, code).await
    }

    /// Switch a host session to inspecting `code`'s data.
    pub async fn view_tenant(&self, code: &str) -> Result<Session, SessionError> {
        let current = self.ctx.session().filter(Session::is_host).ok_or(SessionError::NotHost)?;
        let registry: Registry = self.ctx.sync().load_registry()?;
        let tenant = registry
            .find_tenant(code)
            .cloned()
            .ok_or_else(|| SessionError::UnknownTenant { code: code.trim().to_string() })?;

        let session = Session {
            kind: SessionKind::HostAsTenant,
            tenant_code: tenant.code.clone(),
            tenant_id: Some(tenant.id.clone()),
            tenant_name: Some(tenant.name.clone()),
            name: format!("{} (Host View)", tenant.name),
            role: SessionRole::HostViewingTenant,
            phone: tenant.phone.clone(),
            username: None,
            hostname: None,
            login_time: self.ctx.sync().clock().timestamp(),
            original_session: Some(Box::new(current)),
        };
        self.enter(session.clone(), TenantScope::tenant(&tenant.code), None)
            .instrument(info_span!("view_tenant", tenant = %tenant.code))
            .await?;
        info!(tenant = %tenant.code, "Host viewing tenant");
        Ok(session)
    }

    /// Leave a host-as-tenant session and resume the host session.
    ///
    /// The original host session is restored verbatim when present;
    /// otherwise a fresh one is built from the registry's host record.
    pub async fn return_to_host(&self) -> Result<Session, SessionError> {
        let current = self
            .ctx
            .session()
            .filter(Session::is_host_viewing_tenant)
            .ok_or(SessionError::NotViewingTenant)?;
        let session = match current.original_session {
            Some(original) => *original,
            None => {
                let registry = self.ctx.sync().load_registry()?;
                let host = registry.host.ok_or(SessionError::NoHostAccount)?;
                host_session(&host, self.ctx.sync().clock().timestamp())
            }
        };

        self.ctx.stop_realtime();
        self.ctx.activate_scope(None);
        self.ctx.set_session(Some(session.clone()))?;
        self.bootstrap().await;
        info!("Returned to host");
        Ok(session)
    }

    /// Log out, leaving the context scoped to the host.
    ///
    /// The active document's `user` is cleared and saved before the scope is
    /// left.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let scope = self.ctx.scope();
        self.ctx.update(|doc| doc.user = None)?;
        self.ctx.stop_realtime();
        self.ctx.set_session(None)?;
        self.ctx.activate_scope(None);
        info!(tenant = %scope, "Logged out");
        Ok(())
    }

    /// Resume a session persisted earlier in this context.
    pub async fn restore(&self) -> Result<Option<Session>, SessionError> {
        let session = self.ctx.restore_session()?;
        if session.is_some() {
            self.bootstrap().await;
        }
        Ok(session)
    }

    /// Activate `scope`, stamp the active user into its document, persist
    /// the session and start the post-login work.
    async fn enter(
        &self,
        session: Session,
        scope: TenantScope,
        loaded: Option<TenantAppData>,
    ) -> Result<(), SessionError> {
        self.ctx.stop_realtime();
        let scope = self.ctx.activate_scope(Some(scope.code()));
        let mut doc = match loaded {
            Some(doc) => doc,
            None => self.ctx.sync().load(&scope).await?.unwrap_or_default(),
        };
        doc.user = Some(active_user(&session));
        self.ctx.replace_document(doc)?;
        self.ctx.set_session(Some(session))?;
        self.bootstrap().await;
        Ok(())
    }

    /// Migrate the active document and start realtime. Failures are logged.
    async fn bootstrap(&self) {
        let scope = self.ctx.scope();
        match self.ctx.sync().migrate(&scope).await {
            Ok(true) => info!(tenant = %scope, "Migrated cached data to remote"),
            Ok(false) => {}
            Err(e) => warn!(tenant = %scope, error = %e, "Migration skipped"),
        }
        if let Err(e) = self.ctx.start_realtime().await {
            warn!(tenant = %scope, error = %e, "Realtime subscription failed");
        }
    }
}

fn host_session(host: &HostAccount, login_time: String) -> Session {
    Session {
        kind: SessionKind::Host,
        tenant_code: HOST_CODE.to_string(),
        tenant_id: None,
        tenant_name: None,
        name: host.name.clone(),
        role: SessionRole::HostAdmin,
        phone: normalize_phone(&host.phone),
        username: host.username.clone(),
        hostname: host.hostname.clone(),
        login_time,
        original_session: None,
    }
}

fn active_user(session: &Session) -> ActiveUser {
    ActiveUser {
        phone: session.phone.clone(),
        name: session.name.clone(),
        role: session.role,
        tenant_code: Some(session.tenant_code.clone()),
        tenant_id: session.tenant_id.clone(),
        tenant_name: session.tenant_name.clone(),
        username: session.username.clone(),
        hostname: session.hostname.clone(),
        login_time: session.login_time.clone(),
    }
}
