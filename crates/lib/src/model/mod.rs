//! Documents and records exchanged between the cache, the remote store and
//! the session layer. Field names follow the stored camelCase form.

mod app_data;
mod registry;
mod session;

pub use app_data::{ActiveUser, SubUser, TenantAppData, UserRole};
pub use registry::{HostAccount, Registry, Status, Tenant};
pub use session::{Session, SessionKind, SessionRole};
