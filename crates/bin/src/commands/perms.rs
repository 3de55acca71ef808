//! Permission inspection.

use transitpay::{Portal, permissions::PermissionEngine};

use super::tenant_by_code;
use crate::cli::PermsShowArgs;
use crate::output::{OutputFormat, print_json, print_table};

fn mark(allowed: bool) -> String {
    if allowed { "yes" } else { "-" }.to_string()
}

/// Run the `perms show` command
pub async fn show(portal: &Portal, args: &PermsShowArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let matrix = match &args.code {
        Some(code) => {
            let tenant = tenant_by_code(portal, code)?;
            let ctx = portal.open_context();
            ctx.activate_scope(Some(&tenant.code));
            ctx.reload().await?;
            ctx.effective_permissions(args.role)
        }
        None => PermissionEngine::default().effective(args.role),
    };

    match format {
        OutputFormat::Human => {
            if args.role.locked() {
                println!("{} (locked): {}", args.role, args.role.description());
            } else {
                println!("{}: {}", args.role, args.role.description());
            }
            let rows: Vec<Vec<String>> = matrix
                .iter()
                .map(|(module, p)| {
                    vec![
                        module.to_string(),
                        mark(p.view),
                        mark(p.create),
                        mark(p.edit),
                        mark(p.delete),
                    ]
                })
                .collect();
            print_table(&["MODULE", "VIEW", "CREATE", "EDIT", "DELETE"], &rows, "");
        }
        OutputFormat::Json => print_json(&matrix)?,
    }
    Ok(())
}
