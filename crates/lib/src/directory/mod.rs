//! Tenant and sub-user management.
//!
//! [`TenantDirectory`] edits the shared registry on behalf of the host.
//! [`UserDirectory`] edits the sub-user list of the active tenant document.

mod errors;
mod tenants;
mod users;

pub use errors::DirectoryError;
pub use tenants::{NewTenant, TenantDirectory, TenantUpdate};
pub use users::{NewUser, UserDirectory, UserUpdate};

use crate::Clock;

/// A time-derived id not yet taken, suffixed when two land in one millisecond.
fn unique_id(clock: &dyn Clock, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = clock.time_id(prefix);
    let mut id = base.clone();
    let mut n = 0u32;
    while taken(&id) {
        n += 1;
        id = format!("{base}-{n}");
    }
    id
}
