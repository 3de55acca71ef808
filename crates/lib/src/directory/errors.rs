//! Error types for the tenant and sub-user directories.

use thiserror::Error;

use crate::{keys::KeyError, sync::SyncError};

/// Errors raised by host tenant management and tenant sub-user management.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Name is required")]
    MissingName,

    #[error("Phone number is required")]
    MissingPhone,

    #[error(transparent)]
    InvalidCode(#[from] KeyError),

    /// Another tenant already uses this code (case-insensitive).
    #[error("Tenant code already exists: {code}")]
    DuplicateCode { code: String },

    /// The code sanitizes to a storage key another tenant already owns.
    #[error("Tenant code '{code}' collides with the storage of tenant '{existing}'")]
    StorageKeyCollision { code: String, existing: String },

    /// The code is reserved for the host scope.
    #[error("Tenant code '{code}' is reserved")]
    ReservedCode { code: String },

    #[error("Tenant not found: {id}")]
    TenantNotFound { id: String },

    /// A sub-user with this phone already exists in the tenant.
    #[error("A user with phone {phone} already exists")]
    DuplicatePhone { phone: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    /// The logged-in actor tried to delete their own account.
    #[error("Cannot delete the currently logged-in user")]
    CannotDeleteSelf,

    /// Sub-users can only be managed inside a tenant scope.
    #[error("No tenant is active")]
    NoActiveTenant,

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Failure persisting the working copy.
    #[error("Failed to save tenant data")]
    Storage {
        #[source]
        source: Box<crate::Error>,
    },
}

impl DirectoryError {
    /// Malformed input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DirectoryError::MissingName | DirectoryError::MissingPhone | DirectoryError::InvalidCode(_)
        )
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DirectoryError::TenantNotFound { .. } | DirectoryError::UserNotFound { .. }
        )
    }

    /// The request conflicts with existing records or the session.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DirectoryError::DuplicateCode { .. }
                | DirectoryError::StorageKeyCollision { .. }
                | DirectoryError::ReservedCode { .. }
                | DirectoryError::DuplicatePhone { .. }
                | DirectoryError::CannotDeleteSelf
                | DirectoryError::NoActiveTenant
        )
    }

    pub fn is_transient(&self) -> bool {
        match self {
            DirectoryError::Sync(e) => e.is_transient(),
            DirectoryError::Storage { source } => source.is_transient(),
            _ => false,
        }
    }
}

impl From<crate::Error> for DirectoryError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Directory(e) => e,
            other => DirectoryError::Storage {
                source: Box::new(other),
            },
        }
    }
}

impl From<DirectoryError> for crate::Error {
    fn from(err: DirectoryError) -> Self {
        crate::Error::Directory(err)
    }
}
