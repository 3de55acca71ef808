//! Error types for the local cache.

use thiserror::Error;

/// Errors raised around the local cache.
///
/// Reads and writes of raw strings never fail; these cover decoding stored
/// documents and file persistence.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CacheError {
    /// A stored value could not be decoded as the expected document.
    #[error("Corrupt document under key '{key}'")]
    CorruptDocument {
        /// Cache key of the unreadable value
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A document could not be encoded for storage.
    #[error("Failed to encode document for key '{key}'")]
    EncodeFailed {
        /// Cache key being written
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the persistence file failed.
    #[error("Cache file I/O error")]
    FileIo {
        #[source]
        source: std::io::Error,
    },

    /// The persistence file is not a valid cache snapshot.
    #[error("Invalid cache file")]
    InvalidFile {
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    /// Check if stored data could not be decoded.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            CacheError::CorruptDocument { .. } | CacheError::InvalidFile { .. }
        )
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, CacheError::FileIo { .. })
    }
}

impl From<CacheError> for crate::Error {
    fn from(err: CacheError) -> Self {
        crate::Error::Cache(err)
    }
}
