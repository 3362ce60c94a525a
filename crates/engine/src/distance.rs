//! Distance and normalization functions for vector similarity computation.
//!
//! Functions are single-threaded and deterministic: the same inputs always
//! produce bit-identical outputs.

use revsearch_core::{StoreError, StoreResult};

/// Vectors whose norm is within this distance of 1.0 are left untouched.
pub const NORM_TOLERANCE: f32 = 1e-6;

/// L2 norm (Euclidean length)
///
/// Accumulated in f64: squaring in f32 overflows above ~1.8e19 and
/// loses precision below ~1e-19.
pub fn l2_norm(v: &[f32]) -> f32 {
    l2_norm_f64(v) as f32
}

fn l2_norm_f64(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Squared Euclidean distance
///
/// Monotonic in the true distance, so it is enough for ranking.
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in distance computation");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance (L2 distance)
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Scale `v` to unit L2 norm in place.
///
/// No-op when the norm is already 1.0 within [`NORM_TOLERANCE`]. Only a
/// vector whose components are all exactly zero is left as-is.
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm_f64(v);
    if norm == 0.0 || (norm - 1.0).abs() <= f64::from(NORM_TOLERANCE) {
        return;
    }
    for x in v.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
}

/// Check a vector is usable before it touches any state.
///
/// # Errors
///
/// - `EmptyVector` for a zero-length vector
/// - `DimensionMismatch` if `v.len() != dimension`
/// - `NonFiniteComponent` if any component is NaN or infinite
pub fn validate_vector(v: &[f32], dimension: usize) -> StoreResult<()> {
    if v.is_empty() {
        return Err(StoreError::EmptyVector);
    }
    if v.len() != dimension {
        return Err(StoreError::DimensionMismatch {
            expected: dimension,
            got: v.len(),
        });
    }
    if let Some(index) = v.iter().position(|x| !x.is_finite()) {
        return Err(StoreError::NonFiniteComponent { index });
    }
    Ok(())
}

/// Validate, then return a normalized copy.
pub fn prepare_vector(v: &[f32], dimension: usize) -> StoreResult<Vec<f32>> {
    validate_vector(v, dimension)?;
    let mut out = v.to_vec();
    normalize_in_place(&mut out);
    Ok(out)
}
