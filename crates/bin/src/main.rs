mod cli;
mod commands;
mod output;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use transitpay::model::Status;

use cli::{Cli, Commands, LoginCommand, PermsCommand, TenantCommand, UserCommand};
use output::OutputFormat;
use store::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("transitpay=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format = OutputFormat::from_flag(cli.json);
    let store = Store::open(&cli.store).await?;
    let portal = &store.portal;

    let result = match &cli.command {
        Commands::Seed => commands::tenant::seed(portal),
        Commands::Tenant(cmd) => match cmd {
            TenantCommand::List => commands::tenant::list(portal, format).await,
            TenantCommand::Create(args) => commands::tenant::create(portal, args, format),
            TenantCommand::Suspend(args) => commands::tenant::set_status(portal, args, Status::Suspended, format),
            TenantCommand::Activate(args) => commands::tenant::set_status(portal, args, Status::Active, format),
            TenantCommand::Delete(args) => commands::tenant::delete(portal, args),
        },
        Commands::User(cmd) => match cmd {
            UserCommand::Add(args) => commands::user::add(portal, args, format).await,
            UserCommand::List(args) => commands::user::list(portal, args, format).await,
        },
        Commands::Login(cmd) => match cmd {
            LoginCommand::Host(args) => commands::login::host(portal, args, format).await,
            LoginCommand::Tenant(args) => commands::login::tenant(portal, args, format).await,
        },
        Commands::Perms(PermsCommand::Show(args)) => commands::perms::show(portal, args, format).await,
    };

    // Whatever was written locally is kept even when the command failed.
    store.close().await?;
    result
}
