//! Sub-user commands.

use transitpay::{Portal, TenantContext, directory::NewUser};

use super::tenant_by_code;
use crate::cli::{TenantCodeArgs, UserAddArgs};
use crate::output::{OutputFormat, print_json, print_table};

/// A context scoped to `code` with the freshest copy of its document.
async fn tenant_context(portal: &Portal, code: &str) -> Result<TenantContext, Box<dyn std::error::Error>> {
    let tenant = tenant_by_code(portal, code)?;
    let ctx = portal.open_context();
    ctx.activate_scope(Some(&tenant.code));
    ctx.reload().await?;
    Ok(ctx)
}

/// Run the `user add` command
pub async fn add(portal: &Portal, args: &UserAddArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = tenant_context(portal, &args.code).await?;
    let user = ctx.users().add(NewUser {
        name: args.name.clone(),
        phone: args.phone.clone(),
        role: args.role.into(),
    })?;
    match format {
        OutputFormat::Human => println!("Added {} ({}) as {:?}.", user.name, user.phone, user.role),
        OutputFormat::Json => print_json(&user)?,
    }
    Ok(())
}

/// Run the `user list` command
pub async fn list(portal: &Portal, args: &TenantCodeArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = tenant_context(portal, &args.code).await?;
    let users = ctx.users().list();
    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.name.clone(),
                        u.phone.clone(),
                        format!("{:?}", u.role),
                        format!("{:?}", u.status),
                        u.id.clone(),
                    ]
                })
                .collect();
            print_table(&["NAME", "PHONE", "ROLE", "STATUS", "ID"], &rows, "No sub-users.");
        }
        OutputFormat::Json => print_json(&users)?,
    }
    Ok(())
}
