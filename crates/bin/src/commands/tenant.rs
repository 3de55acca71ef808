//! Tenant registry commands.

use transitpay::{
    Portal,
    directory::NewTenant,
    model::{Status, Tenant},
};

use super::tenant_by_code;
use crate::cli::{TenantCodeArgs, TenantCreateArgs};
use crate::output::{OutputFormat, print_json, print_table};

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Active => "Active",
        Status::Suspended => "Suspended",
    }
}

fn print_tenant(tenant: &Tenant, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => println!(
            "{} ({}) {} [{}]",
            tenant.code,
            tenant.name,
            tenant.phone,
            status_label(tenant.status)
        ),
        OutputFormat::Json => print_json(tenant)?,
    }
    Ok(())
}

/// Run the `seed` command
pub fn seed(portal: &Portal) -> Result<(), Box<dyn std::error::Error>> {
    if portal.tenants().seed_demo()? {
        println!("Seeded demo registry.");
    } else {
        println!("Registry already has tenants, nothing seeded.");
    }
    Ok(())
}

/// Run the `tenant list` command
pub async fn list(portal: &Portal, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let sync = portal.sync();
    if sync.remote().is_some()
        && let Err(e) = sync.pull_registry().await
    {
        tracing::warn!("Using cached registry: {e}");
    }
    let tenants = portal.tenants().list()?;

    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = tenants
                .iter()
                .map(|t| {
                    vec![
                        t.code.clone(),
                        t.name.clone(),
                        t.phone.clone(),
                        status_label(t.status).to_string(),
                        t.id.clone(),
                    ]
                })
                .collect();
            print_table(&["CODE", "NAME", "PHONE", "STATUS", "ID"], &rows, "No tenants found.");
        }
        OutputFormat::Json => print_json(&tenants)?,
    }
    Ok(())
}

/// Run the `tenant create` command
pub fn create(portal: &Portal, args: &TenantCreateArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let tenant = portal.tenants().create(NewTenant {
        code: args.code.clone(),
        name: args.name.clone(),
        phone: args.phone.clone(),
        notes: args.notes.clone(),
    })?;
    print_tenant(&tenant, format)
}

/// Run the `tenant suspend` / `tenant activate` commands
pub fn set_status(
    portal: &Portal,
    args: &TenantCodeArgs,
    status: Status,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let tenant = tenant_by_code(portal, &args.code)?;
    let tenant = portal.tenants().set_status(&tenant.id, status)?;
    print_tenant(&tenant, format)
}

/// Run the `tenant delete` command
pub fn delete(portal: &Portal, args: &TenantCodeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tenant = tenant_by_code(portal, &args.code)?;
    portal.tenants().delete(&tenant.id)?;
    println!("Deleted tenant {}.", tenant.code);
    Ok(())
}
