//! Core types shared by the index, catalog, persistence and store layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, order-preserving key/value metadata attached to a feature
///
/// The store never interprets its contents; it is serialized verbatim.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Dense position of a vector inside the index
///
/// Dense ids are contiguous: with N vectors stored, the ids in use are
/// exactly `0..N`. A rebuild reassigns them for every surviving entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DenseId(pub u64);

impl DenseId {
    /// Create a new DenseId
    pub fn new(id: u64) -> Self {
        DenseId(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Position as a slice index
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DenseId({})", self.0)
    }
}

/// Catalog record for one stored vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Position in the index
    pub dense_id: DenseId,
    /// Caller-supplied identifier (not necessarily unique)
    pub feature_id: String,
    /// Opaque caller metadata
    pub metadata: Metadata,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Feature identifier of the matched entry
    pub feature_id: String,
    /// Euclidean distance between the normalized query and the stored vector
    pub distance: f32,
}

impl SearchHit {
    /// Create a new SearchHit
    pub fn new(feature_id: impl Into<String>, distance: f32) -> Self {
        SearchHit {
            feature_id: feature_id.into(),
            distance,
        }
    }
}

/// Outcome of a removal request
///
/// Unknown identifiers are not an error; they are reported in `not_found`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutcome {
    /// Requested ids that matched at least one entry, in request order
    pub removed: Vec<String>,
    /// Requested ids that matched nothing, in request order
    pub not_found: Vec<String>,
}

/// Read-only snapshot of store sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of vectors in the index
    pub total_vectors: usize,
    /// Configured vector dimension
    pub dimension: usize,
    /// Number of catalog entries (always equals `total_vectors`)
    pub metadata_count: usize,
    /// Whether a cache backend is attached and enabled
    pub cache_enabled: bool,
    /// Index implementation name
    pub index_type: String,
    /// Maximum distance a result may have to be returned
    pub max_distance: f32,
}

/// Validate a feature identifier
///
/// # Validation Rules
/// - Cannot be empty
/// - Cannot exceed 256 bytes
/// - Cannot contain control characters (including null bytes)
/// - Cannot contain path separators or `..`
pub fn validate_feature_id(id: &str) -> Result<(), crate::StoreError> {
    let invalid = |reason: &str| crate::StoreError::InvalidFeatureId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("Feature id cannot be empty"));
    }

    if id.len() > MAX_FEATURE_ID_LEN {
        return Err(invalid("Feature id cannot exceed 256 bytes"));
    }

    if id.chars().any(char::is_control) {
        return Err(invalid("Feature id cannot contain control characters"));
    }

    if id.contains('/') || id.contains('\\') {
        return Err(invalid("Feature id cannot contain path separators"));
    }

    if id.contains("..") {
        return Err(invalid("Feature id cannot contain '..'"));
    }

    Ok(())
}

/// Maximum feature id length in bytes
pub const MAX_FEATURE_ID_LEN: usize = 256;
