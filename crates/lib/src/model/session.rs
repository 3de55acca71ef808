//! Session records.

use serde::{Deserialize, Serialize};

/// What kind of actor a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "host")]
    Host,
    #[serde(rename = "tenant")]
    Tenant,
    #[serde(rename = "host-as-tenant")]
    HostAsTenant,
}

/// The role a session acts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionRole {
    /// The host operator, with unconditional full privilege.
    #[serde(rename = "Host Admin")]
    HostAdmin,
    /// The host operator inspecting a tenant's data.
    #[serde(rename = "Host (Viewing Tenant)")]
    HostViewingTenant,
    /// A tenant's primary phone identity.
    Tenant,
    Admin,
    Operator,
    Viewer,
}

impl SessionRole {
    /// Display label, identical to the stored form.
    pub fn label(self) -> &'static str {
        match self {
            SessionRole::HostAdmin => "Host Admin",
            SessionRole::HostViewingTenant => "Host (Viewing Tenant)",
            SessionRole::Tenant => "Tenant",
            SessionRole::Admin => "Admin",
            SessionRole::Operator => "Operator",
            SessionRole::Viewer => "Viewer",
        }
    }
}

impl std::fmt::Display for SessionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The logged-in state of one browsing context.
///
/// A host inspecting a tenant keeps its own host session in
/// `original_session` so it can be restored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub tenant_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    pub name: String,
    pub role: SessionRole,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub login_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_session: Option<Box<Session>>,
}

impl Session {
    pub fn is_host(&self) -> bool {
        self.kind == SessionKind::Host
    }

    pub fn is_host_viewing_tenant(&self) -> bool {
        self.kind == SessionKind::HostAsTenant
    }

    pub fn is_tenant(&self) -> bool {
        self.kind == SessionKind::Tenant
    }
}
