//! Built-in permission matrices.

use super::{Module, ModulePermissions, Role, RoleMatrix};

const ALL: ModulePermissions = ModulePermissions::new(true, true, true, true);
const NONE: ModulePermissions = ModulePermissions::new(false, false, false, false);
const VIEW: ModulePermissions = ModulePermissions::new(true, false, false, false);
/// View, create and edit; no delete.
const WRITE: ModulePermissions = ModulePermissions::new(true, true, true, false);
/// View and create only.
const SUBMIT: ModulePermissions = ModulePermissions::new(true, true, false, false);

/// Rows are in [`Module::ALL`] order.
const ADMIN: [ModulePermissions; Module::COUNT] = [ALL; Module::COUNT];

const OPERATOR: [ModulePermissions; Module::COUNT] = [
    VIEW,   // dashboard
    WRITE,  // receipts
    WRITE,  // clients
    WRITE,  // trips
    WRITE,  // petrol
    VIEW,   // reports
    SUBMIT, // email
    NONE,   // users
    NONE,   // settings
    NONE,   // dataImport
    NONE,   // tenants
    NONE,   // permissions
];

const VIEWER: [ModulePermissions; Module::COUNT] = [
    VIEW, // dashboard
    VIEW, // receipts
    VIEW, // clients
    VIEW, // trips
    VIEW, // petrol
    VIEW, // reports
    NONE, // email
    NONE, // users
    NONE, // settings
    NONE, // dataImport
    NONE, // tenants
    NONE, // permissions
];

const TENANT: [ModulePermissions; Module::COUNT] = [
    VIEW,   // dashboard
    SUBMIT, // receipts
    WRITE,  // clients
    VIEW,   // trips
    NONE,   // petrol
    VIEW,   // reports
    NONE,   // email
    NONE,   // users
    NONE,   // settings
    NONE,   // dataImport
    NONE,   // tenants
    NONE,   // permissions
];

/// The built-in matrix for `role`.
pub fn default_matrix(role: Role) -> RoleMatrix {
    let rows = match role {
        Role::Admin => ADMIN,
        Role::Operator => OPERATOR,
        Role::Viewer => VIEWER,
        Role::Tenant => TENANT,
    };
    RoleMatrix::from_rows(rows)
}
