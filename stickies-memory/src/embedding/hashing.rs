//! Feature-hashing embeddings
//!
//! Deterministic, dependency-free vectors: every lowercase alphanumeric token
//! is hashed with FNV-1a into one of `dimension` buckets with a hash-derived
//! sign, then the vector is normalized. Texts sharing words land close
//! together; there is no notion of synonyms. Useful offline and in tests.

use super::provider::EmbeddingProvider;
use crate::error::Result;
use crate::similarity::normalize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Default dimension, matching AllMiniLM-L6-v2
pub const DEFAULT_HASH_DIMENSION: usize = 384;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// FNV-1a feature hashing provider
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
    name: String,
}

impl HashingProvider {
    /// `dimension` is clamped to at least 1
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            name: format!("fnv1a-hash-{}", dimension),
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSION)
    }
}

impl EmbeddingProvider for HashingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimension];
        for token in Self::tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
