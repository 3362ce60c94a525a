//! Error types for the vector store

use thiserror::Error;

/// Errors surfaced by store operations
///
/// Cache failures never appear here: the cache layer degrades to a miss
/// and logs instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Vector length doesn't match the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Configured dimension
        expected: usize,
        /// Length of the provided vector
        got: usize,
    },

    /// Invalid dimension specified (must be > 0)
    #[error("Invalid dimension: {dimension} (must be > 0)")]
    InvalidDimension {
        /// The invalid dimension value
        dimension: usize,
    },

    /// Vector has no components
    #[error("Empty vector")]
    EmptyVector,

    /// Vector contains NaN or an infinity
    #[error("Non-finite vector component at index {index}")]
    NonFiniteComponent {
        /// Position of the first offending component
        index: usize,
    },

    /// Feature identifier is malformed
    #[error("Invalid feature id: {id} ({reason})")]
    InvalidFeatureId {
        /// The invalid identifier
        id: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Configuration value is out of range
    #[error("Invalid config: {field} ({reason})")]
    InvalidConfig {
        /// Offending field
        field: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Snapshot write or read failed
    ///
    /// When returned from a mutating call, the in-memory change has already
    /// been applied; only its durability is in doubt.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Feature extraction failed for a reason other than a missing subject
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The extractor found nothing to embed in the image
    #[error("No subject detected in image")]
    NoSubjectDetected,

    /// Store has been closed
    #[error("Store is closed")]
    Closed,
}

impl StoreError {
    /// Check if this error is a validation error
    ///
    /// Validation errors are always raised before any state change.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            StoreError::DimensionMismatch { .. }
                | StoreError::InvalidDimension { .. }
                | StoreError::EmptyVector
                | StoreError::NonFiniteComponent { .. }
                | StoreError::InvalidFeatureId { .. }
                | StoreError::InvalidConfig { .. }
        )
    }

    /// Check if this error came from the snapshot layer
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, StoreError::Persistence(_))
    }

    /// Shorthand for an `InvalidConfig` error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
