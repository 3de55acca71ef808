//! The shared tenant registry document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Clock,
    constants::{DEMO_PHONE, DEMO_TENANT_CODE},
};

/// Account status shared by tenants and sub-users.
///
/// Anything other than `Active` in a stored document reads as `Suspended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Active,
    #[serde(other)]
    Suspended,
}

impl Status {
    /// The other status.
    pub fn toggled(self) -> Self {
        match self {
            Status::Active => Status::Suspended,
            Status::Suspended => Status::Active,
        }
    }

    pub fn is_active(self) -> bool {
        self == Status::Active
    }
}

/// The single host operator account of a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostAccount {
    pub phone: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A tenant record in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub code: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    /// Set on records synthesized from a tenant document when the registry
    /// had not caught up yet. Never persisted.
    #[serde(default, skip_serializing)]
    pub is_discovered: bool,
}

impl Tenant {
    /// Case-insensitive code comparison.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }
}

/// Registry of the host account and every tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostAccount>,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    #[serde(rename = "_migrated", default, skip_serializing_if = "std::ops::Not::not")]
    pub migrated: bool,
    /// Fields this version does not model, kept for round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Registry {
    /// The demo registry: a placeholder host and the `DEMO` tenant.
    pub fn seeded(clock: &dyn Clock) -> Self {
        let now = clock.timestamp();
        Self {
            host: Some(HostAccount {
                phone: DEMO_PHONE.to_string(),
                name: "System Admin".to_string(),
                username: None,
                hostname: None,
                created_at: now.clone(),
                updated_at: None,
            }),
            tenants: vec![Tenant {
                id: clock.time_id("TN"),
                code: DEMO_TENANT_CODE.to_string(),
                name: "Demo Transport".to_string(),
                phone: DEMO_PHONE.to_string(),
                status: Status::Active,
                notes: Some("Primary tenant account".to_string()),
                created_at: now.clone(),
                updated_at: now,
                is_discovered: false,
            }],
            migrated: false,
            extra: Map::new(),
        }
    }

    /// Find a tenant by code, ignoring case.
    pub fn find_tenant(&self, code: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.has_code(code))
    }

    /// Whether a tenant with `code` is listed, ignoring case.
    pub fn contains_tenant(&self, code: &str) -> bool {
        self.find_tenant(code).is_some()
    }

    /// Find a tenant by its opaque id.
    pub fn find_by_id(&self, id: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.id == id)
    }

    pub(crate) fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Tenant> {
        self.tenants.iter_mut().find(|t| t.id == id)
    }
}
