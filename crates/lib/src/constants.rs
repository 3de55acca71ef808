//! Storage keys, remote paths and seed values shared across modules.

/// Tenant code used for the host operator's own scope.
pub const HOST_CODE: &str = "HOST";

/// Local cache key holding the host scope's document.
pub const HOST_STORAGE_KEY: &str = "transitpay_data";

/// Prefix for every tenant-scoped local cache key.
pub const TENANT_KEY_PREFIX: &str = "transitpay_";

/// Local cache key holding the tenant registry.
pub const REGISTRY_KEY: &str = "transitpay_registry";

/// Session store key holding the active session.
pub const SESSION_KEY: &str = "transitpay_session";

/// Remote collection holding one document per tenant.
pub const TENANTS_COLLECTION: &str = "tenants";

/// Remote path of the shared registry document.
pub const REGISTRY_PATH: &str = "config/registry";

/// Country dialing code prepended to local-format phone numbers.
pub const COUNTRY_CODE: &str = "60";

/// Shortest raw phone input accepted at login.
pub const MIN_PHONE_INPUT_LEN: usize = 6;

/// Receipt numbering starts here for a fresh tenant.
pub const FIRST_RECEIPT_NUMBER: u64 = 1001;

/// Phone of the seeded demo host and demo tenant.
pub const DEMO_PHONE: &str = "+60123456789";

/// Placeholder host phone written by earlier seeds.
pub const LEGACY_DEMO_PHONE: &str = "+60198765432";

/// Code of the seeded demo tenant.
pub const DEMO_TENANT_CODE: &str = "DEMO";

/// Pickup/drop-off locations every new tenant starts with.
pub const DEFAULT_LOCATIONS: &[&str] = &[
    "Kuala Lumpur",
    "Petaling Jaya",
    "Shah Alam",
    "Subang Jaya",
    "Putrajaya",
    "Cyberjaya",
    "Klang",
    "Ampang",
    "Cheras",
    "Kepong",
    "Setapak",
    "Wangsa Maju",
    "Sri Hartamas",
    "Mont Kiara",
    "Bangsar",
    "KLIA",
    "KLIA2",
];

/// Car plates every new tenant starts with.
pub const DEFAULT_CAR_PLATES: &[&str] = &["BPE813", "SMN1538"];
