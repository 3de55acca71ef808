//!
//! TransitPay: tenant-scoped, local-first sync, sessions and permissions.
//!
//! This library is the multi-tenant core of the TransitPay portal. It keeps
//! every tenant's data isolated under its own storage key, syncs that data
//! between a fast local cache and an eventually consistent remote store,
//! and manages who is logged in and what they may do.
//!
//! ## Core Concepts
//!
//! * **Tenant scopes (`keys::TenantScope`)**: the storage key and remote path
//!   derived from a tenant code. Every document read or write goes through one.
//! * **Registry (`model::Registry`)**: the shared list of tenants plus the single
//!   host account.
//! * **Sync (`sync::SyncCoordinator`)**: local-first saves with ordered background
//!   pushes, remote-preferred loads, one-time migration and the bounded
//!   registry convergence wait.
//! * **Contexts (`TenantContext`)**: one actor's active scope, session and working
//!   copy, kept fresh by a realtime subscription (`realtime::RealtimeChannel`).
//! * **Sessions (`SessionManager`)**: host and tenant login, tenant discovery,
//!   host impersonation and logout.
//! * **Permissions (`permissions::PermissionEngine`)**: role × module × action
//!   matrices with per-tenant overrides for unlocked roles.
//! * **Directories (`directory`)**: tenant and sub-user management.
//! * **Portal (`Portal`)**: opens contexts over shared storage tiers.

pub mod cache;
pub mod clock;
pub mod constants;
pub mod context;
pub mod directory;
pub mod keys;
pub mod model;
pub mod permissions;
pub mod phone;
pub mod portal;
pub mod realtime;
pub mod remote;
pub mod session;
pub mod sync;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use context::{TenantContext, WorkingCopy};
pub use portal::Portal;
pub use session::{HostLogin, SessionError, SessionManager};

/// Result type used throughout the TransitPay library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the TransitPay library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Tenant code validation errors from the keys module
    #[error(transparent)]
    Key(keys::KeyError),

    /// Local cache errors
    #[error(transparent)]
    Cache(cache::CacheError),

    /// Remote store errors
    #[error(transparent)]
    Remote(remote::RemoteError),

    /// Errors from the sync coordinator
    #[error(transparent)]
    Sync(sync::SyncError),

    /// Login and session transition errors
    #[error(transparent)]
    Session(session::SessionError),

    /// Permission validation and enforcement errors
    #[error(transparent)]
    Permission(permissions::PermissionError),

    /// Tenant and sub-user management errors
    #[error(transparent)]
    Directory(directory::DirectoryError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Key(_) => "keys",
            Error::Cache(_) => "cache",
            Error::Remote(_) => "remote",
            Error::Sync(_) => "sync",
            Error::Session(_) => "session",
            Error::Permission(_) => "permissions",
            Error::Directory(_) => "directory",
        }
    }

    /// Missing or malformed input from the actor.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Key(e) => e.is_validation_error(),
            Error::Session(e) => e.is_validation_error(),
            Error::Permission(e) => e.is_validation_error(),
            Error::Directory(e) => e.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Session(e) => e.is_not_found(),
            Error::Directory(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// The records exist but their state forbids the operation.
    pub fn is_state_error(&self) -> bool {
        match self {
            Error::Session(e) => e.is_state_error(),
            Error::Directory(e) => e.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Permission(e) => e.is_denied(),
            _ => false,
        }
    }

    /// Remote unreachable, timed out or otherwise worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Remote(e) => e.is_transient(),
            Error::Sync(e) => e.is_transient(),
            Error::Session(e) => e.is_transient(),
            Error::Directory(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Cache(e) => e.is_io_error(),
            _ => false,
        }
    }
}
