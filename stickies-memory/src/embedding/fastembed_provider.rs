//! FastEmbed ONNX embeddings
//!
//! Local AllMiniLM-L6-v2 sentence embeddings (384 dimensions), downloaded
//! from the Hugging Face Hub into the model cache on first load.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;

use super::provider::EmbeddingProvider;
use crate::error::{NoteError, Result};
use crate::similarity::normalize;

const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// FastEmbed configuration
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    /// Where ONNX models are cached
    pub cache_dir: PathBuf,
    /// Show a progress bar while downloading (default: false)
    pub show_download_progress: bool,
    /// Batch size for encoding (default: 64)
    pub batch_size: usize,
}

impl FastEmbedConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            show_download_progress: false,
            batch_size: 64,
        }
    }
}

/// FastEmbed model wrapper
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    config: FastEmbedConfig,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Load the model, downloading it into `config.cache_dir` if needed.
    ///
    /// This is slow (seconds, or minutes on first download) and blocks.
    pub fn load(config: FastEmbedConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.cache_dir)?;

        log::info!("Loading {} from: {}", MODEL_NAME, config.cache_dir.display());

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(config.show_download_progress);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| NoteError::provider_load_failed(format!("Failed to load {}: {}", MODEL_NAME, e)))?;

        // Get dimension by encoding a test string
        let probe = model
            .embed(vec!["test"], None)
            .map_err(|e| NoteError::provider_load_failed(format!("Failed to encode test string: {}", e)))?;
        let dimension = probe
            .first()
            .map(|v| v.len())
            .ok_or_else(|| NoteError::provider_load_failed("Model returned no embedding"))?;

        log::info!("Loaded {} ({}d)", MODEL_NAME, dimension);

        Ok(Self {
            model: Mutex::new(model),
            config,
            dimension,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &FastEmbedConfig {
        &self.config
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut model = self.model.lock();
        let mut embeddings = model
            .embed(vec![text], None)
            .map_err(|e| NoteError::provider_unavailable(format!("Failed to encode text: {}", e)))?;

        let mut vector = embeddings
            .pop()
            .ok_or_else(|| NoteError::provider_unavailable("No embedding returned"))?;
        normalize(&mut vector);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self.model.lock();
        let mut embeddings = model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| NoteError::provider_unavailable(format!("Failed to encode texts: {}", e)))?;

        for vector in embeddings.iter_mut() {
            normalize(vector);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
