use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use transitpay::{
    Portal, TenantContext,
    cache::InMemoryCache,
    directory::{NewTenant, NewUser},
    model::{Tenant, UserRole},
    remote::{InMemoryRemote, RemoteStore},
    sync::SyncConfig,
};

pub const DEMO_PHONE: &str = "+60123456789";
pub const SUB_USER_PHONE: &str = "+60199990000";

/// A portal plus handles on its storage tiers, so tests can poke at them.
pub struct TestPortal {
    pub portal: Portal,
    pub cache: Arc<InMemoryCache>,
    pub remote: Arc<InMemoryRemote>,
}

impl TestPortal {
    /// Another device: a fresh cache sharing this portal's remote store.
    pub fn second_device(&self) -> Portal {
        Portal::open(
            Arc::new(InMemoryCache::new()),
            Some(self.remote.clone() as Arc<dyn RemoteStore>),
            SyncConfig::default(),
        )
    }

    pub async fn settle(&self) {
        settle(&self.portal).await;
    }
}

/// Let queued pushes and realtime deliveries run.
pub async fn settle(portal: &Portal) {
    portal.flush().await.expect("Failed to flush pushes");
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// A portal with an empty cache and an empty, online remote.
pub fn test_portal() -> TestPortal {
    let cache = Arc::new(InMemoryCache::new());
    let remote = Arc::new(InMemoryRemote::new());
    let portal = Portal::open(
        cache.clone(),
        Some(remote.clone() as Arc<dyn RemoteStore>),
        SyncConfig::default(),
    );
    TestPortal { portal, cache, remote }
}

/// A portal with no remote store at all.
pub fn local_portal() -> Portal {
    Portal::open(Arc::new(InMemoryCache::new()), None, SyncConfig::default())
}

/// A portal whose registry holds the demo host and the `DEMO` tenant.
pub fn seeded_portal() -> TestPortal {
    let tp = test_portal();
    tp.portal.tenants().seed_demo().expect("Failed to seed registry");
    tp
}

pub fn create_tenant(portal: &Portal, code: &str, phone: &str) -> Tenant {
    portal
        .tenants()
        .create(NewTenant {
            code: code.to_string(),
            name: format!("{code} Transport"),
            phone: phone.to_string(),
            notes: None,
        })
        .expect("Failed to create tenant")
}

/// Add a sub-user to `code` through a throwaway context.
pub async fn add_sub_user(portal: &Portal, code: &str, name: &str, phone: &str, role: UserRole) -> String {
    let ctx = portal.open_context();
    ctx.activate_scope(Some(code));
    ctx.reload().await.expect("Failed to load tenant data");
    let user = ctx
        .users()
        .add(NewUser {
            name: name.to_string(),
            phone: phone.to_string(),
            role,
        })
        .expect("Failed to add sub-user");
    settle(portal).await;
    user.id
}

/// A tenant document as another device would have written it.
pub fn remote_tenant_doc(code: &str, owner_phone: &str) -> Value {
    json!({
        "user": {
            "phone": owner_phone,
            "name": format!("{code} Owner"),
            "role": "Tenant",
            "tenantCode": code,
            "tenantId": format!("TN-{code}"),
            "tenantName": format!("{code} Transport"),
            "loginTime": "2024-01-01T00:00:00.000Z"
        },
        "receipts": [],
        "users": [],
        "nextReceiptNumber": 1001
    })
}

/// Log in to `code` with `phone`, owner or sub-user.
pub async fn login_tenant(ctx: &TenantContext, code: &str, phone: &str) {
    ctx.sessions()
        .login_tenant(code, phone)
        .await
        .expect("Tenant login failed");
}
