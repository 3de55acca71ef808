//! Local-first saves, remote-preferred loads and the registry convergence wait.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;
use transitpay::{keys::TenantScope, model::TenantAppData, remote::InMemoryRemote};

use crate::helpers::*;

fn doc_with_receipt_number(n: u64) -> TenantAppData {
    TenantAppData {
        next_receipt_number: n,
        ..Default::default()
    }
}

/// A remote registry listing only the `LATE` tenant.
fn late_registry() -> Value {
    json!({"tenants": [{"id": "TN-1", "code": "LATE", "name": "Late", "phone": "+60111111111"}]})
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let tp = test_portal();
    let sync = tp.portal.sync();
    let scope = TenantScope::tenant("ACME");
    let doc = doc_with_receipt_number(1234);
    sync.save(&scope, &doc).unwrap();
    tp.settle().await;
    assert_eq!(sync.load(&scope).await.unwrap(), Some(doc));
}

#[tokio::test]
async fn pushes_land_in_submission_order() {
    let tp = test_portal();
    let sync = tp.portal.sync();
    let scope = TenantScope::tenant("ACME");
    for n in 1001..1011 {
        sync.save(&scope, &doc_with_receipt_number(n)).unwrap();
    }
    sync.flush().await.unwrap();
    let stored = tp.remote.peek("tenants/ACME").await.unwrap();
    assert_eq!(stored["nextReceiptNumber"], 1010);
}

#[tokio::test]
async fn failed_push_keeps_local_copy() {
    let tp = test_portal();
    tp.remote.set_online(false);
    let sync = tp.portal.sync();
    let scope = TenantScope::tenant("ACME");

    sync.save(&scope, &doc_with_receipt_number(1500)).expect("Save must not surface push failures");
    sync.flush().await.unwrap();

    assert!(tp.remote.peek("tenants/ACME").await.is_none());
    let local = sync.load(&scope).await.unwrap().unwrap();
    assert_eq!(local.next_receipt_number, 1500);
}

#[tokio::test]
async fn load_falls_back_to_cache_on_remote_failure() {
    let tp = test_portal();
    let sync = tp.portal.sync();
    let scope = TenantScope::tenant("ACME");
    sync.save(&scope, &doc_with_receipt_number(1100)).unwrap();
    sync.flush().await.unwrap();

    tp.remote.put_external("tenants/ACME", json!({"nextReceiptNumber": 9999})).await;
    tp.remote.fail_next(1);
    let doc = sync.load(&scope).await.unwrap().unwrap();
    assert_eq!(doc.next_receipt_number, 1100);

    // The next load reaches the remote and overwrites the cache.
    let doc = sync.load(&scope).await.unwrap().unwrap();
    assert_eq!(doc.next_receipt_number, 9999);
    assert_eq!(sync.load_local(&scope).unwrap().unwrap().next_receipt_number, 9999);
}

#[tokio::test]
async fn migration_skips_already_migrated_remote() {
    let tp = test_portal();
    let sync = tp.portal.sync();
    let scope = TenantScope::tenant("ACME");
    tp.remote
        .put_external("tenants/ACME", json!({"_migrated": true, "nextReceiptNumber": 7}))
        .await;
    sync.cache().set_item(scope.storage_key(), "{}".to_string());

    assert!(!sync.migrate(&scope).await.unwrap());
    assert_eq!(tp.remote.peek("tenants/ACME").await.unwrap()["nextReceiptNumber"], 7);
}

#[tokio::test]
async fn registry_migrates_once() {
    let tp = seeded_portal();
    let sync = tp.portal.sync();
    tp.settle().await;

    assert!(sync.migrate_registry().await.unwrap());
    assert_eq!(tp.remote.peek("config/registry").await.unwrap()["_migrated"], true);
    assert!(!sync.migrate_registry().await.unwrap());
}

#[tokio::test]
async fn move_document_relocates_both_tiers() {
    let tp = test_portal();
    let sync = tp.portal.sync();
    let from = TenantScope::tenant("OLD");
    let to = TenantScope::tenant("NEW");
    sync.save(&from, &doc_with_receipt_number(4242)).unwrap();

    sync.move_document(&from, &to).await.unwrap();

    assert!(sync.load_local(&from).unwrap().is_none());
    assert_eq!(sync.load_local(&to).unwrap().unwrap().next_receipt_number, 4242);
    assert!(tp.remote.peek("tenants/OLD").await.is_none());
    assert_eq!(tp.remote.peek("tenants/NEW").await.unwrap()["nextReceiptNumber"], 4242);
}

#[tokio::test(start_paused = true)]
async fn await_registry_sees_tenant_created_on_another_device() {
    let tp = test_portal();
    let device_b = tp.second_device();
    create_tenant(&device_b, "ACME", "0123000111");
    device_b.flush().await.unwrap();

    let found = tp
        .portal
        .sync()
        .await_registry(Duration::from_secs(8), Some("acme"))
        .await;
    assert!(found);
    assert!(tp.portal.registry().unwrap().contains_tenant("ACME"));
}

#[tokio::test(start_paused = true)]
async fn await_registry_keeps_polling_until_tenant_appears() {
    let tp = test_portal();
    let remote = tp.remote.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        remote
            .put_external("config/registry", late_registry())
            .await;
    });

    let start = Instant::now();
    let found = tp
        .portal
        .sync()
        .await_registry(Duration::from_secs(8), Some("LATE"))
        .await;
    assert!(found);
    assert!(start.elapsed() < Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn await_registry_gives_up_when_remote_unreachable() {
    let tp = test_portal();
    tp.remote.set_online(false);

    let start = Instant::now();
    let found = tp
        .portal
        .sync()
        .await_registry(Duration::from_secs(8), Some("ACME"))
        .await;
    assert!(!found);
    assert!(start.elapsed() <= Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn await_registry_accepts_cached_tenant_while_offline() {
    let tp = seeded_portal();
    tp.remote.set_online(false);
    let found = tp
        .portal
        .sync()
        .await_registry(Duration::from_secs(8), Some("DEMO"))
        .await;
    assert!(found);
}

#[tokio::test(start_paused = true)]
async fn await_registry_reports_missing_tenant_when_online() {
    let tp = seeded_portal();
    let found = tp
        .portal
        .sync()
        .await_registry(Duration::from_secs(3), Some("NOPE"))
        .await;
    assert!(!found);
}

#[tokio::test(start_paused = true)]
async fn concurrent_waits_share_fetches() {
    let single = test_portal();
    single
        .portal
        .sync()
        .await_registry(Duration::from_secs(3), Some("GHOST"))
        .await;
    let alone = single.remote.fetch_count();

    let shared = test_portal();
    let sync = shared.portal.sync();
    let (a, b) = tokio::join!(
        sync.await_registry(Duration::from_secs(3), Some("GHOST")),
        sync.await_registry(Duration::from_secs(3), Some("ghost")),
    );
    assert!(!a && !b);
    assert_eq!(shared.remote.fetch_count(), alone);
}

#[tokio::test(start_paused = true)]
async fn long_wait_outlives_a_shorter_shared_one() {
    let tp = test_portal();
    let remote = tp.remote.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        remote.put_external("config/registry", late_registry()).await;
    });

    let sync = tp.portal.sync();
    let (short, long) = tokio::join!(
        sync.await_registry(Duration::from_secs(1), Some("LATE")),
        sync.await_registry(Duration::from_secs(8), Some("LATE")),
    );
    assert!(!short);
    assert!(long);
}

#[tokio::test(start_paused = true)]
async fn await_registry_waits_for_remote_to_come_online() {
    let tp = test_portal();
    tp.remote.put_external("config/registry", late_registry()).await;
    tp.remote.set_online(false);
    let remote = tp.remote.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        remote.set_online(true);
    });

    let start = Instant::now();
    let found = tp
        .portal
        .sync()
        .await_registry(Duration::from_secs(8), Some("LATE"))
        .await;
    assert!(found);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn await_registry_stops_when_remote_drops_mid_wait() {
    let tp = seeded_portal();
    tp.settle().await;
    let remote = tp.remote.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        remote.set_online(false);
    });

    let start = Instant::now();
    let sync = tp.portal.sync();
    let found = sync.await_registry(Duration::from_secs(8), Some("LATE")).await;
    assert!(!found);
    assert!(start.elapsed() < Duration::from_secs(4));

    // The loop is over, nothing polls any more.
    let fetches = tp.remote.fetch_count();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(tp.remote.fetch_count(), fetches);
    // The cached registry still answers.
    assert!(sync.await_registry(Duration::from_secs(1), Some("DEMO")).await);
}

#[tokio::test]
async fn remote_snapshot_survives_a_file_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("remote.json");

    let remote = InMemoryRemote::new();
    remote.put_external("tenants/DEMO", json!({"nextReceiptNumber": 1001})).await;
    remote.save_to_file(&path).await.expect("Failed to save remote");

    let loaded = InMemoryRemote::load_from_file(&path).expect("Failed to load remote");
    assert_eq!(loaded.peek("tenants/DEMO").await.unwrap()["nextReceiptNumber"], 1001);
}
