//! Role-based permissions over application modules.
//!
//! Every tenant role has a built-in [`RoleMatrix`] of module × action grants.
//! Unlocked roles (Operator, Viewer) can be customized per tenant through
//! [`PermissionOverrides`] stored in the tenant document; locked roles
//! (Admin, Tenant) always use their defaults. The host admin bypasses the
//! matrix entirely.
//!
//! Overrides apply field by field: an override that sets only `delete` for a
//! module keeps the default `view`, `create` and `edit` for that module.

mod defaults;
mod errors;

pub use defaults::default_matrix;
pub use errors::PermissionError;

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::model::SessionRole;

/// A tenant-level role with a permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Operator,
    Viewer,
    /// A tenant's primary login.
    Tenant,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Operator, Role::Viewer, Role::Tenant];

    /// Locked roles ignore stored overrides.
    pub fn locked(self) -> bool {
        matches!(self, Role::Admin | Role::Tenant)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Operator => "Operator",
            Role::Viewer => "Viewer",
            Role::Tenant => "Tenant",
        }
    }

    /// One-line summary shown next to the role.
    pub fn description(self) -> &'static str {
        match self {
            Role::Admin => "Full access to everything. Can manage users and permissions.",
            Role::Operator => "Can add and edit records, but cannot delete or change settings.",
            Role::Viewer => "Read-only access. Cannot create, edit, or delete anything.",
            Role::Tenant => "Client portal access. Can view their own data including clients.",
        }
    }

    /// The matrix a session role is checked against. `None` for the host
    /// admin, who is never checked.
    pub fn for_session(role: SessionRole) -> Option<Role> {
        match role {
            SessionRole::HostAdmin => None,
            SessionRole::HostViewingTenant | SessionRole::Tenant => Some(Role::Tenant),
            SessionRole::Admin => Some(Role::Admin),
            SessionRole::Operator => Some(Role::Operator),
            SessionRole::Viewer => Some(Role::Viewer),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PermissionError::UnknownRole { name: s.to_string() })
    }
}

/// An application area guarded by permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Module {
    Dashboard,
    Receipts,
    Clients,
    Trips,
    Petrol,
    Reports,
    Email,
    Users,
    Settings,
    DataImport,
    Tenants,
    Permissions,
}

impl Module {
    pub const COUNT: usize = 12;

    pub const ALL: [Module; Module::COUNT] = [
        Module::Dashboard,
        Module::Receipts,
        Module::Clients,
        Module::Trips,
        Module::Petrol,
        Module::Reports,
        Module::Email,
        Module::Users,
        Module::Settings,
        Module::DataImport,
        Module::Tenants,
        Module::Permissions,
    ];

    /// Stored name, e.g. `dataImport`.
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Receipts => "receipts",
            Module::Clients => "clients",
            Module::Trips => "trips",
            Module::Petrol => "petrol",
            Module::Reports => "reports",
            Module::Email => "email",
            Module::Users => "users",
            Module::Settings => "settings",
            Module::DataImport => "dataImport",
            Module::Tenants => "tenants",
            Module::Permissions => "permissions",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| PermissionError::UnknownModule { name: s.to_string() })
    }
}

/// Something a role may do within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| PermissionError::UnknownAction { name: s.to_string() })
    }
}

/// Grants for one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePermissions {
    pub view: bool,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
}

impl ModulePermissions {
    pub const fn new(view: bool, create: bool, edit: bool, delete: bool) -> Self {
        Self {
            view,
            create,
            edit,
            delete,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }

    /// Mutating grants require `view`.
    pub fn is_consistent(&self) -> bool {
        self.view || !(self.create || self.edit || self.delete)
    }

    fn apply(&mut self, patch: &PartialPermissions) {
        self.view = patch.view.unwrap_or(self.view);
        self.create = patch.create.unwrap_or(self.create);
        self.edit = patch.edit.unwrap_or(self.edit);
        self.delete = patch.delete.unwrap_or(self.delete);
    }
}

/// A full module × action grant table for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMatrix {
    rows: [ModulePermissions; Module::COUNT],
}

impl RoleMatrix {
    pub(crate) const fn from_rows(rows: [ModulePermissions; Module::COUNT]) -> Self {
        Self { rows }
    }

    pub fn get(&self, module: Module) -> ModulePermissions {
        self.rows[module.index()]
    }

    pub fn allows(&self, action: Action, module: Module) -> bool {
        self.get(module).allows(action)
    }

    /// Rows in [`Module::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Module, ModulePermissions)> + '_ {
        Module::ALL.into_iter().map(|m| (m, self.get(m)))
    }

    fn apply(&mut self, role_override: &RoleOverride) {
        for (name, patch) in &role_override.permissions {
            if let Ok(module) = name.parse::<Module>() {
                self.rows[module.index()].apply(patch);
            }
        }
    }
}

impl Serialize for RoleMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Module::COUNT))?;
        for (module, perms) in self.iter() {
            map.serialize_entry(module.as_str(), &perms)?;
        }
        map.end()
    }
}

/// A per-module patch; unset fields keep the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

impl PartialPermissions {
    fn set(&mut self, action: Action, allowed: bool) {
        let slot = match action {
            Action::View => &mut self.view,
            Action::Create => &mut self.create,
            Action::Edit => &mut self.edit,
            Action::Delete => &mut self.delete,
        };
        *slot = Some(allowed);
    }
}

/// Stored customization for one role, keyed by module name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleOverride {
    #[serde(default)]
    pub permissions: BTreeMap<String, PartialPermissions>,
}

/// Per-tenant role customizations, as stored in `rolePermissions`.
///
/// Keys are role names; entries for unknown roles or modules are kept but
/// have no effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionOverrides(BTreeMap<String, RoleOverride>);

impl PermissionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one grant for `role`.
    pub fn set(&mut self, role: Role, module: Module, action: Action, allowed: bool) -> &mut Self {
        self.0
            .entry(role.as_str().to_string())
            .or_default()
            .permissions
            .entry(module.as_str().to_string())
            .or_default()
            .set(action, allowed);
        self
    }

    /// The stored override for `role`, if any.
    pub fn role(&self, role: Role) -> Option<&RoleOverride> {
        self.0.get(role.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge the unlocked roles of `incoming` into `self`, replacing each
    /// supplied role's entry wholesale.
    ///
    /// Locked and unknown roles are dropped without error. Fails, leaving
    /// `self` untouched, if any resulting matrix grants a mutating action on
    /// a module its role cannot view.
    pub fn merge_from(&mut self, incoming: PermissionOverrides) -> Result<Vec<Role>, PermissionError> {
        let mut accepted = Vec::new();
        for (name, role_override) in incoming.0 {
            let Ok(role) = name.parse::<Role>() else {
                continue;
            };
            if role.locked() {
                continue;
            }
            let mut matrix = default_matrix(role);
            matrix.apply(&role_override);
            if let Some((module, _)) = matrix.iter().find(|(_, p)| !p.is_consistent()) {
                return Err(PermissionError::ViewRequired { role, module });
            }
            accepted.push((role, role_override));
        }
        let roles = accepted.iter().map(|(role, _)| *role).collect();
        for (role, role_override) in accepted {
            self.0.insert(role.as_str().to_string(), role_override);
        }
        Ok(roles)
    }
}

/// Permission lookups against one tenant's stored overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEngine<'a> {
    overrides: Option<&'a PermissionOverrides>,
}

impl<'a> PermissionEngine<'a> {
    pub fn new(overrides: Option<&'a PermissionOverrides>) -> Self {
        Self { overrides }
    }

    /// The matrix in force for `role`.
    pub fn effective(&self, role: Role) -> RoleMatrix {
        let mut matrix = default_matrix(role);
        if role.locked() {
            return matrix;
        }
        if let Some(role_override) = self.overrides.and_then(|o| o.role(role)) {
            matrix.apply(role_override);
        }
        matrix
    }

    /// Whether a session acting as `role` may perform `action` on `module`.
    pub fn can(&self, role: SessionRole, action: Action, module: Module) -> bool {
        match Role::for_session(role) {
            None => true,
            Some(role) => self.effective(role).allows(action, module),
        }
    }

    /// [`can`](Self::can) with names as stored; unknown names are denied.
    pub fn can_named(&self, role: SessionRole, action: &str, module: &str) -> bool {
        if role == SessionRole::HostAdmin {
            return true;
        }
        match (action.parse::<Action>(), module.parse::<Module>()) {
            (Ok(action), Ok(module)) => self.can(role, action, module),
            _ => false,
        }
    }

    /// Like [`can`](Self::can), but as a `Result`.
    pub fn require(&self, role: SessionRole, action: Action, module: Module) -> Result<(), PermissionError> {
        if self.can(role, action, module) {
            Ok(())
        } else {
            Err(PermissionError::Denied {
                role,
                action,
                module,
            })
        }
    }
}
