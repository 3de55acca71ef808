//! Live snapshots into a context's working copy.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde_json::json;
use transitpay::{model::TenantAppData, remote::RemoteError};

use crate::helpers::*;

#[tokio::test]
async fn snapshot_from_another_device_reaches_working_copy() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    tp.settle().await;

    tp.remote
        .put_external("tenants/DEMO", json!({"nextReceiptNumber": 2000, "receipts": [{"no": 1999}]}))
        .await;
    tp.settle().await;

    let doc = ctx.document();
    assert_eq!(doc.next_receipt_number, 2000);
    assert_eq!(doc.receipts.len(), 1);
    // The remote snapshot carried no user; the logged-in actor stays.
    assert_eq!(doc.user.expect("User lost on snapshot").phone, DEMO_PHONE);
}

#[tokio::test]
async fn callback_runs_for_each_applied_snapshot() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    ctx.on_update(Arc::new(move |_: &TenantAppData| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    tp.settle().await;
    let before = calls.load(Ordering::SeqCst);

    tp.remote
        .put_external("tenants/DEMO", json!({"nextReceiptNumber": 3000}))
        .await;
    tp.settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn no_snapshot_applies_after_unsubscribe() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    tp.settle().await;
    assert!(ctx.realtime().is_active());

    ctx.stop_realtime();
    assert!(!ctx.realtime().is_active());
    let before = ctx.document().next_receipt_number;
    tp.remote
        .put_external("tenants/DEMO", json!({"nextReceiptNumber": before + 500}))
        .await;
    tp.settle().await;

    assert_eq!(ctx.document().next_receipt_number, before);
}

#[tokio::test]
async fn channel_error_keeps_subscription_alive() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    tp.settle().await;

    tp.remote
        .inject_channel_error("tenants/DEMO", RemoteError::Transport("stream reset".into()));
    tp.remote
        .put_external("tenants/DEMO", json!({"nextReceiptNumber": 4321}))
        .await;
    tp.settle().await;

    assert!(ctx.realtime().is_active());
    assert_eq!(ctx.document().next_receipt_number, 4321);
}

#[tokio::test]
async fn switching_scope_resubscribes() {
    let tp = seeded_portal();
    create_tenant(&tp.portal, "ACME", "0123000111");
    tp.settle().await;
    let ctx = tp.portal.open_context();

    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    tp.settle().await;
    login_tenant(&ctx, "ACME", "0123000111").await;
    tp.settle().await;

    assert_eq!(ctx.realtime().scope().map(|s| s.code().to_string()), Some("ACME".into()));
    tp.remote
        .put_external("tenants/DEMO", json!({"nextReceiptNumber": 9000}))
        .await;
    tp.settle().await;
    assert_ne!(ctx.document().next_receipt_number, 9000);
}
