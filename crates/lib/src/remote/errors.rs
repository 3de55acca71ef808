//! Error types for the remote document store.

use thiserror::Error;

/// Errors returned by a [`RemoteStore`](super::RemoteStore).
///
/// Cloneable so the same failure can be delivered to every subscriber.
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The remote channel is offline.
    #[error("Remote store unreachable while accessing '{path}'")]
    Unreachable {
        /// Document path of the failed operation
        path: String,
    },

    /// The operation did not complete in time.
    #[error("Remote operation on '{path}' timed out")]
    Timeout {
        /// Document path of the failed operation
        path: String,
    },

    /// The store refused the operation.
    #[error("Remote store rejected operation on '{path}': {reason}")]
    Rejected {
        /// Document path of the failed operation
        path: String,
        /// Reason reported by the store
        reason: String,
    },

    /// A fetched document could not be decoded.
    #[error("Invalid remote document at '{path}': {reason}")]
    InvalidDocument {
        /// Document path of the undecodable document
        path: String,
        /// Decoder message
        reason: String,
    },

    /// Any other transport-level failure.
    #[error("Remote transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Check if retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Unreachable { .. } | RemoteError::Timeout { .. } | RemoteError::Transport(_)
        )
    }

    /// The document path involved, when known.
    pub fn path(&self) -> Option<&str> {
        match self {
            RemoteError::Unreachable { path }
            | RemoteError::Timeout { path }
            | RemoteError::Rejected { path, .. }
            | RemoteError::InvalidDocument { path, .. } => Some(path),
            RemoteError::Transport(_) => None,
        }
    }
}

impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        crate::Error::Remote(err)
    }
}
