//! Login commands: resolve a login the way the portal would and print the session.

use transitpay::{HostLogin, Portal, SessionError, model::Session};

use crate::cli::{HostLoginArgs, TenantLoginArgs};
use crate::output::{OutputFormat, print_json};

fn report(result: Result<Session, SessionError>, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let session = match result {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!("Login refused: {e}");
            return Err(e.user_message().into());
        }
    };
    match format {
        OutputFormat::Human => println!(
            "Logged in as {} ({}) in {}",
            session.name, session.role, session.tenant_code
        ),
        OutputFormat::Json => print_json(&session)?,
    }
    Ok(())
}

/// Run the `login host` command
pub async fn host(portal: &Portal, args: &HostLoginArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = portal.open_context();
    let mut login = HostLogin::new(args.phone.clone());
    if let Some(name) = &args.name {
        login = login.name(name.clone());
    }
    let result = ctx.sessions().login_host(login).await;
    report(result, format)
}

/// Run the `login tenant` command
pub async fn tenant(portal: &Portal, args: &TenantLoginArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = portal.open_context();
    let result = ctx.sessions().login_tenant(&args.code, &args.phone).await;
    report(result, format)
}
