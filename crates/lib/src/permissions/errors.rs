//! Error types for the permission engine.

use thiserror::Error;

use super::{Action, Module, Role};
use crate::model::SessionRole;

/// Errors produced by permission checks and override edits.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PermissionError {
    /// An override would allow a mutating action on a module the role cannot view.
    #[error("{role} needs view access to '{module}' before it can be granted other actions")]
    ViewRequired { role: Role, module: Module },

    /// The acting role may not perform the action.
    #[error("{role} is not allowed to {action} {module}")]
    Denied {
        role: SessionRole,
        action: Action,
        module: Module,
    },

    #[error("Unknown role '{name}'")]
    UnknownRole { name: String },

    #[error("Unknown module '{name}'")]
    UnknownModule { name: String },

    #[error("Unknown action '{name}'")]
    UnknownAction { name: String },
}

impl PermissionError {
    /// Check if this error describes malformed input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            PermissionError::ViewRequired { .. }
                | PermissionError::UnknownRole { .. }
                | PermissionError::UnknownModule { .. }
                | PermissionError::UnknownAction { .. }
        )
    }

    /// Check if this error is a refused action.
    pub fn is_denied(&self) -> bool {
        matches!(self, PermissionError::Denied { .. })
    }
}

impl From<PermissionError> for crate::Error {
    fn from(err: PermissionError) -> Self {
        crate::Error::Permission(err)
    }
}
