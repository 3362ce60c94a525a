//! Flat vector index - contiguous storage with exact brute-force search
//!
//! VectorIndex stores embeddings in a contiguous `Vec<f32>` for
//! cache-friendly scanning. Positions are dense ids.
//!
//! # Invariants
//!
//! - `data.len() == len() * dimension`
//! - Dense ids in use are exactly `0..len()`
//! - Append-only: the only way to drop a vector is `rebuild_excluding`,
//!   which produces a fresh index with survivors renumbered in order

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use revsearch_core::{DenseId, StoreError, StoreResult};

use crate::distance::euclidean_distance_squared;

/// Index implementation name reported in stats
pub const INDEX_TYPE: &str = "flat-l2";

/// Append-only dense matrix of fixed-dimension vectors
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,

    /// Layout: [v0_dim0, v0_dim1, ..., v0_dimN, v1_dim0, v1_dim1, ...]
    data: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new(dimension: usize) -> StoreResult<Self> {
        if dimension == 0 {
            return Err(StoreError::InvalidDimension { dimension });
        }
        Ok(VectorIndex {
            dimension,
            data: Vec::new(),
        })
    }

    /// Create from a row-major matrix (for snapshot load)
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> StoreResult<Self> {
        if dimension == 0 {
            return Err(StoreError::InvalidDimension { dimension });
        }
        if data.len() % dimension != 0 {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                got: data.len() % dimension,
            });
        }
        Ok(VectorIndex { dimension, data })
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of every stored vector (for snapshot save)
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Append a vector, returning its dense id (the previous `len()`)
    pub fn append(&mut self, vector: &[f32]) -> StoreResult<DenseId> {
        if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        let id = DenseId::new(self.len() as u64);
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    /// Stored vector at a position
    pub fn reconstruct(&self, id: DenseId) -> Option<&[f32]> {
        let start = id.as_usize().checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Iterate vectors in dense-id order
    pub fn iter(&self) -> impl Iterator<Item = (DenseId, &[f32])> {
        self.data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, row)| (DenseId::new(i as u64), row))
    }

    /// Exact k-nearest-neighbor search by Euclidean distance
    ///
    /// 1. Score every vector in dense-id order (O(N·D), single-threaded)
    /// 2. Sort by (distance asc, dense id asc)
    /// 3. Truncate to k
    ///
    /// Returned distances are true (not squared) L2 distances. `k == 0` or
    /// an empty index yields an empty list.
    pub fn search(&self, query: &[f32], k: usize) -> StoreResult<Vec<(DenseId, f32)>> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(DenseId, f32)> = self
            .iter()
            .map(|(id, row)| (id, euclidean_distance_squared(query, row)))
            .collect();

        let by_distance_then_id = |a: &(DenseId, f32), b: &(DenseId, f32)| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_id);
            scored.truncate(k);
        }
        scored.sort_by(by_distance_then_id);

        Ok(scored
            .into_iter()
            .map(|(id, squared)| (id, squared.sqrt()))
            .collect())
    }

    /// Build a fresh index without the excluded positions
    ///
    /// Survivors keep their relative order and are renumbered densely.
    /// Returns the new index and the old → new id mapping for survivors.
    /// Excluded ids beyond `len()` are ignored.
    pub fn rebuild_excluding(
        &self,
        excluded: &BTreeSet<DenseId>,
    ) -> (VectorIndex, BTreeMap<DenseId, DenseId>) {
        let mut rebuilt = VectorIndex {
            dimension: self.dimension,
            data: Vec::with_capacity(self.data.len()),
        };
        let mut remap = BTreeMap::new();

        for (old_id, row) in self.iter() {
            if excluded.contains(&old_id) {
                continue;
            }
            let new_id = DenseId::new(rebuilt.len() as u64);
            rebuilt.data.extend_from_slice(row);
            remap.insert(old_id, new_id);
        }

        (rebuilt, remap)
    }
}
