//! On-disk vector encoding
//!
//! Version 2 (current): raw little-endian `f32`, 4 bytes per element, no header.
//! Version 1 stored vectors as JSON text arrays and is only read by migration.

use crate::error::{NoteError, Result};

/// Format version recorded under `_db_version`
pub const VECTOR_ENCODING_VERSION: u32 = 2;

const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Encode a vector as raw little-endian f32 bytes
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * F32_WIDTH);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode raw little-endian f32 bytes
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % F32_WIDTH != 0 {
        return Err(NoteError::store(format!(
            "vector payload of {} bytes is not a multiple of {}",
            bytes.len(),
            F32_WIDTH
        )));
    }

    Ok(bytes
        .chunks_exact(F32_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Decode a version 1 vector (JSON text array such as `[0.1,0.2]`)
pub fn decode_legacy_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    Ok(serde_json::from_slice(bytes)?)
}
