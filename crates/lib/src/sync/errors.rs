//! Error types for the synchronization layer.

use thiserror::Error;

use crate::{cache::CacheError, remote::RemoteError};

/// Errors that can occur during synchronization operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SyncError {
    /// The operation needs a remote store and none is configured.
    #[error("No remote store configured")]
    NoRemote,

    /// The remote store failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local cache held an unreadable document.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A remote document did not match the expected shape.
    #[error("Invalid document at '{path}'")]
    InvalidDocument {
        /// Remote path of the document
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The background push worker has shut down.
    #[error("Background push worker stopped")]
    WorkerStopped,
}

impl SyncError {
    /// Check if this failure is transient (retrying later may succeed).
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::NoRemote | SyncError::WorkerStopped => true,
            SyncError::Remote(e) => e.is_transient(),
            SyncError::Cache(_) | SyncError::InvalidDocument { .. } => false,
        }
    }
}

impl From<SyncError> for crate::Error {
    fn from(err: SyncError) -> Self {
        crate::Error::Sync(err)
    }
}
