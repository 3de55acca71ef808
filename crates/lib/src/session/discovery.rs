//! Tenant discovery from its data document.
//!
//! A tenant provisioned moments ago may already have a remote document while
//! the registry has not reached this context. Discovery reads that document
//! directly and, if its `user` record names the tenant, synthesizes a tenant
//! record from it.

use tracing::{info, warn};

use super::SessionError;
use crate::{
    context::TenantContext,
    model::{SessionRole, Status, Tenant},
};

/// Try to discover `code` (already normalized) from its remote document.
///
/// Leaves the context scoped to `code`; the caller reverts it on failure.
pub(super) async fn discover(ctx: &TenantContext, code: &str) -> Result<Tenant, SessionError> {
    let sync = ctx.sync();
    info!(tenant = %code, "Tenant not in registry, trying discovery");
    tokio::time::sleep(sync.config().discovery_settle).await;

    let scope = ctx.activate_scope(Some(code));
    let doc = match sync.fetch_remote(&scope).await {
        Ok(doc) => doc,
        Err(e) if e.is_transient() => {
            warn!(tenant = %code, error = %e, "Discovery fetch failed");
            return Err(e.into());
        }
        Err(e) => {
            warn!(tenant = %code, error = %e, "Discovered document unreadable");
            None
        }
    };

    let user = doc.and_then(|d| d.user).filter(|u| {
        u.tenant_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(code))
    });
    let Some(user) = user else {
        return Err(SessionError::UnknownTenant {
            code: code.to_string(),
        });
    };

    info!(tenant = %code, "Tenant discovered from its document");
    // Only an owner record carries the tenant's primary phone.
    let phone = if user.role == SessionRole::Tenant {
        user.phone
    } else {
        String::new()
    };
    Ok(Tenant {
        id: user
            .tenant_id
            .unwrap_or_else(|| sync.clock().time_id("TN")),
        code: code.to_string(),
        name: user.tenant_name.unwrap_or_else(|| code.to_string()),
        phone,
        status: Status::Active,
        notes: None,
        created_at: String::new(),
        updated_at: String::new(),
        is_discovered: true,
    })
}
