//! Vector similarity primitives
//!
//! Embedding providers emit unit-normalized vectors, so for stored vectors
//! cosine similarity equals the dot product. The full formula is still used so
//! that arbitrary (non-normalized) input behaves correctly.
//!
//! Vectors of different lengths are a programming error and are reported as
//! [`NoteError::InvalidDimension`]; nothing is truncated or padded.

use crate::error::{NoteError, Result};

/// Norms below this are treated as zero
const EPSILON: f32 = 1e-10;

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(NoteError::invalid_dimension(a.len(), b.len()));
    }
    Ok(())
}

/// Dot product of two equal-length vectors
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(dot_unchecked(a, b))
}

/// Cosine similarity in [-1, 1]. A zero-magnitude input yields 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let dot = dot_unchecked(a, b);
    let norm_a = dot_unchecked(a, a).sqrt();
    let norm_b = dot_unchecked(b, b).sqrt();

    if norm_a < EPSILON || norm_b < EPSILON {
        Ok(0.0)
    } else {
        Ok(dot / (norm_a * norm_b))
    }
}

/// Squared L2 distance
pub fn squared_euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(squared_distance_unchecked(a, b))
}

/// L2 distance; non-negative and symmetric
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    squared_euclidean_distance(a, b).map(f32::sqrt)
}

/// Normalize a vector in place to unit length
pub fn normalize(vector: &mut [f32]) {
    let norm = dot_unchecked(vector, vector).sqrt();
    if norm > EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Callers must have validated lengths
pub(crate) fn dot_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Callers must have validated lengths
pub(crate) fn squared_distance_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
