//! Subcommand implementations.

pub mod login;
pub mod perms;
pub mod tenant;
pub mod user;

use transitpay::{Portal, model::Tenant};

/// Look up a tenant by code or fail with a readable message.
pub(crate) fn tenant_by_code(portal: &Portal, code: &str) -> Result<Tenant, Box<dyn std::error::Error>> {
    portal
        .tenants()
        .find(code)?
        .ok_or_else(|| format!("No tenant with code '{}'", code.trim().to_uppercase()).into())
}
