//! Per-tenant application document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{SessionRole, Status};
use crate::{
    constants::{DEFAULT_CAR_PLATES, DEFAULT_LOCATIONS, FIRST_RECEIPT_NUMBER},
    permissions::{PermissionOverrides, Role},
};

/// Roles a tenant may grant to its sub-users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Operator,
    Viewer,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Role::Admin,
            UserRole::Operator => Role::Operator,
            UserRole::Viewer => Role::Viewer,
        }
    }
}

impl From<UserRole> for SessionRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => SessionRole::Admin,
            UserRole::Operator => SessionRole::Operator,
            UserRole::Viewer => SessionRole::Viewer,
        }
    }
}

/// A role-scoped login identity nested under a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubUser {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// The actor currently logged in to a tenant document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub phone: String,
    pub name: String,
    pub role: SessionRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default)]
    pub login_time: String,
}

fn default_locations() -> Vec<String> {
    DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect()
}

fn default_car_plates() -> Vec<String> {
    DEFAULT_CAR_PLATES.iter().map(|s| s.to_string()).collect()
}

fn first_receipt_number() -> u64 {
    FIRST_RECEIPT_NUMBER
}

/// Everything one tenant owns, stored as a single document.
///
/// Collections missing from older documents read as empty (locations and
/// car plates read as the defaults). Business records (receipts, clients,
/// expenses, email history) are opaque to this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantAppData {
    #[serde(default)]
    pub user: Option<ActiveUser>,
    #[serde(default)]
    pub receipts: Vec<Value>,
    #[serde(default)]
    pub clients: Vec<Value>,
    #[serde(default)]
    pub users: Vec<SubUser>,
    #[serde(default)]
    pub petrol_expenses: Vec<Value>,
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    #[serde(default = "default_car_plates")]
    pub car_plates: Vec<String>,
    #[serde(default)]
    pub email_history: Vec<Value>,
    #[serde(default = "first_receipt_number")]
    pub next_receipt_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_permissions: Option<PermissionOverrides>,
    #[serde(rename = "_migrated", default, skip_serializing_if = "std::ops::Not::not")]
    pub migrated: bool,
    #[serde(rename = "_migratedAt", default, skip_serializing_if = "Option::is_none")]
    pub migrated_at: Option<String>,
    /// Fields this version does not model, kept for round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TenantAppData {
    fn default() -> Self {
        Self {
            user: None,
            receipts: Vec::new(),
            clients: Vec::new(),
            users: Vec::new(),
            petrol_expenses: Vec::new(),
            locations: default_locations(),
            car_plates: default_car_plates(),
            email_history: Vec::new(),
            next_receipt_number: FIRST_RECEIPT_NUMBER,
            role_permissions: None,
            migrated: false,
            migrated_at: None,
            extra: Map::new(),
        }
    }
}

impl TenantAppData {
    /// Find a sub-user whose phone matches after normalization.
    pub fn find_user_by_phone(&self, phone: &str) -> Option<&SubUser> {
        self.users
            .iter()
            .find(|u| crate::phone::phones_match(&u.phone, phone))
    }
}
