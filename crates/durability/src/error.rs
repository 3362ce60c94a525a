//! Snapshot error types

use revsearch_core::StoreError;
use thiserror::Error;

/// Errors raised while writing or reading snapshot artifacts
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Vector blob shorter than its header claims
    #[error("Vector blob too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Expected minimum size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected RSVB, found {found:?}")]
    InvalidMagic {
        /// Found bytes
        found: [u8; 4],
    },

    /// Unsupported format version
    #[error("Unsupported vector blob version: {0}")]
    UnsupportedVersion(u8),

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the footer
        expected: u32,
        /// Checksum computed over the payload
        actual: u32,
    },

    /// Blob dimension differs from the configured one
    #[error("Dimension mismatch: snapshot has {found}, store expects {expected}")]
    DimensionMismatch {
        /// Configured dimension
        expected: usize,
        /// Dimension recorded in the blob
        found: usize,
    },

    /// Metadata document could not be encoded or decoded
    #[error("Metadata document error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The two artifacts don't describe the same snapshot
    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(String),

    /// Only one of the two artifacts exists
    #[error("Missing snapshot artifact: {0}")]
    MissingArtifact(String),
}

impl PersistenceError {
    /// Whether the on-disk data is unusable (as opposed to an IO failure)
    pub fn is_corruption(&self) -> bool {
        !matches!(self, PersistenceError::Io(_))
    }
}

impl From<PersistenceError> for StoreError {
    fn from(e: PersistenceError) -> Self {
        StoreError::Persistence(e.to_string())
    }
}

/// Result type alias for snapshot operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;
