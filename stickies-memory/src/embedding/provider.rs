use crate::error::Result;

/// Maps text to a fixed-dimension vector.
///
/// Implementations must be thread-safe and return unit-normalized vectors of
/// length [`dimension`](Self::dimension). Calls may block (model inference,
/// network), so [`VectorEngine`](super::VectorEngine) runs them on the
/// blocking pool.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// Human-readable model identifier
    fn model_name(&self) -> &str;
}
