//! CLI argument definitions for the TransitPay binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use transitpay::{model::UserRole, permissions::Role};

/// TransitPay tenant portal operator tool
#[derive(Parser, Debug)]
#[command(name = "transitpay")]
#[command(about = "TransitPay: tenant registry, sessions and permissions")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where state is kept between invocations.
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding cache.json and remote.json
    #[arg(short = 'D', long, global = true, default_value = ".", env = "TRANSITPAY_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Run against the local cache only
    #[arg(long, global = true, env = "TRANSITPAY_OFFLINE")]
    pub offline: bool,

    /// How long a login waits for the registry to converge
    #[arg(long, global = true, default_value_t = 8000, env = "TRANSITPAY_REGISTRY_TIMEOUT_MS")]
    pub registry_timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the demo registry (placeholder host and the DEMO tenant)
    Seed,
    /// Manage tenants
    #[command(subcommand)]
    Tenant(TenantCommand),
    /// Manage a tenant's sub-users
    #[command(subcommand)]
    User(UserCommand),
    /// Resolve a login and print the resulting session
    #[command(subcommand)]
    Login(LoginCommand),
    /// Inspect role permissions
    #[command(subcommand)]
    Perms(PermsCommand),
}

#[derive(Subcommand, Debug)]
pub enum TenantCommand {
    /// List all tenants
    List,
    /// Create a tenant
    Create(TenantCreateArgs),
    /// Suspend a tenant
    Suspend(TenantCodeArgs),
    /// Reactivate a suspended tenant
    Activate(TenantCodeArgs),
    /// Delete a tenant and its data
    Delete(TenantCodeArgs),
}

#[derive(clap::Args, Debug)]
pub struct TenantCreateArgs {
    /// Tenant code (3-12 letters, digits or dashes)
    #[arg(long)]
    pub code: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Owner phone number
    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct TenantCodeArgs {
    /// Tenant code
    pub code: String,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Add a sub-user to a tenant
    Add(UserAddArgs),
    /// List a tenant's sub-users
    List(TenantCodeArgs),
}

/// Roles that can be granted to a sub-user
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SubUserRole {
    Admin,
    Operator,
    Viewer,
}

impl From<SubUserRole> for UserRole {
    fn from(role: SubUserRole) -> Self {
        match role {
            SubUserRole::Admin => UserRole::Admin,
            SubUserRole::Operator => UserRole::Operator,
            SubUserRole::Viewer => UserRole::Viewer,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct UserAddArgs {
    /// Tenant code
    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long, value_enum, default_value = "viewer")]
    pub role: SubUserRole,
}

#[derive(Subcommand, Debug)]
pub enum LoginCommand {
    /// Log in as the host operator
    Host(HostLoginArgs),
    /// Log in to a tenant as its owner or a sub-user
    Tenant(TenantLoginArgs),
}

#[derive(clap::Args, Debug)]
pub struct HostLoginArgs {
    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct TenantLoginArgs {
    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub phone: String,
}

#[derive(Subcommand, Debug)]
pub enum PermsCommand {
    /// Print the effective permission matrix of a role
    Show(PermsShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct PermsShowArgs {
    /// Admin, Operator, Viewer or Tenant
    #[arg(long)]
    pub role: Role,

    /// Tenant whose overrides apply (defaults only when omitted)
    #[arg(long)]
    pub code: Option<String>,
}
