//! Permission checks through a logged-in context and stored overrides.

use transitpay::{
    HostLogin,
    model::UserRole,
    permissions::{Action, Module, PermissionOverrides, Role, default_matrix},
};

use crate::helpers::*;

#[tokio::test]
async fn operator_follows_default_matrix() {
    let tp = seeded_portal();
    tp.settle().await;
    add_sub_user(&tp.portal, "DEMO", "Ali", SUB_USER_PHONE, UserRole::Operator).await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", SUB_USER_PHONE).await;

    assert!(ctx.can(Action::Create, Module::Receipts));
    assert!(!ctx.can(Action::Delete, Module::Receipts));
    let err = ctx.require(Action::View, Module::Users).unwrap_err();
    assert!(err.is_denied());
}

#[tokio::test]
async fn stored_override_reaches_other_devices() {
    let tp = seeded_portal();
    tp.settle().await;
    add_sub_user(&tp.portal, "DEMO", "Ali", SUB_USER_PHONE, UserRole::Operator).await;

    let owner = tp.portal.open_context();
    login_tenant(&owner, "DEMO", DEMO_PHONE).await;
    let mut overrides = PermissionOverrides::new();
    overrides.set(Role::Operator, Module::Receipts, Action::Delete, true);
    let accepted = owner.save_permissions(overrides).expect("Failed to save permissions");
    assert_eq!(accepted, vec![Role::Operator]);
    tp.settle().await;

    let device_b = tp.second_device();
    let ctx = device_b.open_context();
    login_tenant(&ctx, "DEMO", SUB_USER_PHONE).await;
    assert!(ctx.can(Action::Delete, Module::Receipts));
    // Untouched fields keep their defaults.
    assert!(ctx.can(Action::Edit, Module::Receipts));
    assert!(!ctx.can(Action::Delete, Module::Clients));
}

#[tokio::test]
async fn locked_role_override_is_dropped() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;

    let mut overrides = PermissionOverrides::new();
    overrides.set(Role::Admin, Module::Receipts, Action::View, false);
    overrides.set(Role::Tenant, Module::Petrol, Action::View, true);
    let accepted = ctx.save_permissions(overrides).expect("Failed to save permissions");

    assert!(accepted.is_empty());
    assert_eq!(ctx.effective_permissions(Role::Admin), default_matrix(Role::Admin));
    assert!(!ctx.can(Action::View, Module::Petrol));
}

#[tokio::test]
async fn override_without_view_is_rejected() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;

    let mut overrides = PermissionOverrides::new();
    overrides.set(Role::Viewer, Module::Settings, Action::Edit, true);
    let err = ctx.save_permissions(overrides).unwrap_err();

    assert!(err.is_validation_error());
    assert!(ctx.document().role_permissions.is_none());
}

#[tokio::test]
async fn host_admin_is_never_refused() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    ctx.sessions()
        .login_host(HostLogin::new(DEMO_PHONE))
        .await
        .expect("Host login failed");

    for module in Module::ALL {
        for action in Action::ALL {
            assert!(ctx.can(action, module), "host refused {action} on {module}");
        }
    }
}

#[tokio::test]
async fn host_viewing_tenant_uses_tenant_matrix() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    ctx.sessions()
        .login_host(HostLogin::new(DEMO_PHONE))
        .await
        .expect("Host login failed");
    ctx.sessions().view_tenant("DEMO").await.expect("View tenant failed");

    assert!(ctx.can(Action::View, Module::Receipts));
    assert!(!ctx.can(Action::Delete, Module::Receipts));
    assert!(!ctx.can(Action::View, Module::Tenants));
}

#[tokio::test]
async fn logged_out_context_is_a_viewer() {
    let tp = seeded_portal();
    let ctx = tp.portal.open_context();
    assert!(ctx.can(Action::View, Module::Dashboard));
    assert!(!ctx.can(Action::Create, Module::Receipts));
}
