//! End-to-end flows across the directory, session and sync layers.

use transitpay::{
    HostLogin, SessionError,
    directory::UserUpdate,
    keys::TenantScope,
    model::{SessionKind, SessionRole, Status, UserRole},
};

use crate::helpers::*;

/// Host claims the portal, creates a tenant, and the tenant logs in with a
/// local-format phone.
#[tokio::test(start_paused = true)]
async fn tenant_created_by_host_logs_in_with_local_phone() {
    let tp = test_portal();
    let host = tp.portal.open_context();
    host.sessions()
        .login_host(HostLogin::new("0111222333").name("Operator"))
        .await
        .expect("Host login failed");
    create_tenant(&tp.portal, "DEMO", "+60123456789");
    tp.settle().await;

    let ctx = tp.portal.open_context();
    let session = ctx
        .sessions()
        .login_tenant("DEMO", "0123456789")
        .await
        .expect("Tenant login failed");
    assert_eq!(session.phone, "+60123456789");
    assert_eq!(session.role, SessionRole::Tenant);
}

#[tokio::test]
async fn sub_user_login_uses_sub_user_role() {
    let tp = seeded_portal();
    tp.settle().await;
    add_sub_user(&tp.portal, "DEMO", "Ali", SUB_USER_PHONE, UserRole::Operator).await;

    let ctx = tp.portal.open_context();
    let session = ctx
        .sessions()
        .login_tenant("DEMO", SUB_USER_PHONE)
        .await
        .expect("Sub-user login failed");
    assert_eq!(session.role, SessionRole::Operator);
    assert_ne!(session.role, SessionRole::Tenant);
}

#[tokio::test]
async fn suspended_sub_user_gets_a_distinct_reason() {
    let tp = seeded_portal();
    tp.settle().await;
    let id = add_sub_user(&tp.portal, "DEMO", "Ali", SUB_USER_PHONE, UserRole::Operator).await;
    let owner = tp.portal.open_context();
    login_tenant(&owner, "DEMO", DEMO_PHONE).await;
    owner
        .users()
        .update(
            &id,
            UserUpdate {
                status: Some(Status::Suspended),
                ..Default::default()
            },
        )
        .expect("Failed to suspend sub-user");
    tp.settle().await;

    let ctx = tp.portal.open_context();
    let err = ctx.sessions().login_tenant("DEMO", SUB_USER_PHONE).await.unwrap_err();
    assert!(matches!(err, SessionError::SubUserSuspended { .. }));
    assert!(!err.is_not_found());
    let unknown = SessionError::PhoneMismatch { code: "DEMO".into() };
    assert_ne!(err.user_message(), unknown.user_message());
}

#[tokio::test]
async fn host_impersonation_round_trip() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    let host = ctx
        .sessions()
        .login_host(HostLogin::new(DEMO_PHONE))
        .await
        .expect("Host login failed");
    assert_eq!(ctx.scope(), TenantScope::host());

    ctx.sessions().view_tenant("DEMO").await.expect("View tenant failed");
    assert_eq!(ctx.session().unwrap().kind, SessionKind::HostAsTenant);
    assert_eq!(ctx.scope().storage_key(), "transitpay_DEMO");

    let back = ctx.sessions().return_to_host().await.expect("Return to host failed");
    assert_eq!(back, host);
    assert_eq!(ctx.session(), Some(host));
    assert_eq!(ctx.scope().storage_key(), "transitpay_data");
}

#[tokio::test]
async fn contexts_in_one_process_stay_isolated() {
    let tp = seeded_portal();
    create_tenant(&tp.portal, "ACME", "0123000111");
    tp.settle().await;

    let demo = tp.portal.open_context();
    let acme = tp.portal.open_context();
    login_tenant(&demo, "DEMO", DEMO_PHONE).await;
    login_tenant(&acme, "ACME", "0123000111").await;

    demo.update(|doc| doc.next_receipt_number = 5000).expect("Failed to save");
    tp.settle().await;

    assert_eq!(demo.document().next_receipt_number, 5000);
    assert_eq!(acme.document().next_receipt_number, 1001);
    assert_eq!(acme.scope(), TenantScope::tenant("ACME"));
    let cached = tp
        .portal
        .sync()
        .load_local(&TenantScope::tenant("ACME"))
        .unwrap()
        .unwrap();
    assert_eq!(cached.next_receipt_number, 1001);
}

#[tokio::test(start_paused = true)]
async fn offline_edits_reach_remote_on_next_login() {
    let tp = seeded_portal();
    tp.settle().await;
    tp.remote.set_online(false);

    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    ctx.update(|doc| doc.car_plates.push("WXY1234".into())).expect("Failed to save");
    ctx.sessions().logout().await.expect("Logout failed");
    tp.settle().await;
    assert!(tp.remote.peek("tenants/DEMO").await.is_none());

    tp.remote.set_online(true);
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    tp.settle().await;

    let remote = tp.remote.peek("tenants/DEMO").await.expect("Document not migrated");
    assert!(
        remote["carPlates"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p == "WXY1234")
    );
}
