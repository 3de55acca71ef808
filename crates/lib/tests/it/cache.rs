//! Local cache behavior and file persistence.

use transitpay::{
    cache::{InMemoryCache, LocalCache, LocalCacheExt},
    model::TenantAppData,
};

#[test]
fn typed_documents_round_trip() {
    let cache = InMemoryCache::new();
    let doc = TenantAppData {
        next_receipt_number: 1500,
        ..Default::default()
    };
    cache.set_document("transitpay_DEMO", &doc).unwrap();
    let back: TenantAppData = cache.get_document("transitpay_DEMO").unwrap().unwrap();
    assert_eq!(back, doc);
    assert!(cache.get_document::<TenantAppData>("transitpay_ACME").unwrap().is_none());
}

#[test]
fn corrupt_document_is_reported() {
    let cache = InMemoryCache::new();
    cache.set_item("transitpay_DEMO", "{not json".to_string());
    let err = cache.get_document::<TenantAppData>("transitpay_DEMO").unwrap_err();
    assert!(err.is_corrupt());
}

#[test]
fn remove_item_forgets_the_key() {
    let cache = InMemoryCache::new();
    cache.set_item("k", "v".to_string());
    cache.remove_item("k");
    assert!(cache.get_item("k").is_none());
    assert!(cache.is_empty());
}

#[test]
fn cache_survives_a_file_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("cache.json");

    let cache = InMemoryCache::new();
    cache.set_item("transitpay_registry", r#"{"tenants":[]}"#.to_string());
    cache.set_item("transitpay_DEMO", "{}".to_string());
    cache.save_to_file(&path).expect("Failed to save cache");

    let loaded = InMemoryCache::load_from_file(&path).expect("Failed to load cache");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get_item("transitpay_DEMO").as_deref(), Some("{}"));
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let loaded = InMemoryCache::load_from_file(dir.path().join("absent.json")).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn garbage_file_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "[1, 2").unwrap();
    let err = InMemoryCache::load_from_file(&path).unwrap_err();
    assert!(err.is_corrupt());
}
