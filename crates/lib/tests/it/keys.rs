//! Tenant code validation and storage key derivation.

use transitpay::keys::{KeyError, TenantScope, remote_path, resolve_key, sanitize_code, validate_code};

#[test]
fn host_aliases_share_one_key() {
    assert_eq!(resolve_key(None), "transitpay_data");
    assert_eq!(resolve_key(Some("")), "transitpay_data");
    assert_eq!(resolve_key(Some("host")), "transitpay_data");
    assert_eq!(TenantScope::tenant("HOST"), TenantScope::host());
    assert!(TenantScope::tenant("Host").is_host());
}

#[test]
fn codes_differing_by_case_share_a_key() {
    assert_eq!(resolve_key(Some("acme")), resolve_key(Some("ACME")));
    assert_eq!(resolve_key(Some("Acme")), "transitpay_ACME");
    assert_eq!(remote_path(Some("acme")), "tenants/ACME");
}

#[test]
fn resolve_key_is_idempotent() {
    for input in ["demo", "a.b c", "TEAM-1", "x/y", "ÅBC"] {
        let first = resolve_key(Some(input));
        assert_eq!(first, resolve_key(Some(input)));
    }
}

#[test]
fn unsafe_characters_are_replaced() {
    assert_eq!(sanitize_code(Some("a.b c")), "A_B_C");
    assert_eq!(sanitize_code(Some("x/y")), "X_Y");
    assert_eq!(sanitize_code(None), "HOST");
}

#[test]
fn validation_trims_and_uppercases() {
    assert_eq!(validate_code("  demo ").unwrap(), "DEMO");
    assert_eq!(validate_code("team-42").unwrap(), "TEAM-42");
}

#[test]
fn validation_rejects_malformed_codes() {
    assert!(matches!(validate_code("   "), Err(KeyError::MissingCode)));
    for bad in ["AB", "THIRTEENCHARS", "A_B", "A B", "ACME!"] {
        let err = validate_code(bad).unwrap_err();
        assert!(matches!(err, KeyError::InvalidFormat { .. }), "{bad} should be rejected");
        assert!(err.is_validation_error());
    }
}

#[test]
fn scope_addresses_follow_the_code() {
    let scope = TenantScope::tenant(" acme ");
    assert_eq!(scope.code(), "ACME");
    assert_eq!(scope.storage_key(), "transitpay_ACME");
    assert_eq!(scope.remote_path(), "tenants/ACME");
    assert_eq!(TenantScope::host().remote_path(), "tenants/HOST");
}
