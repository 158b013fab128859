//! Vector embedding engine
//!
//! High-level API for generating and caching embeddings. The provider is
//! loaded lazily, at most once per engine: concurrent callers await the same
//! in-flight load, and a failed load is remembered so later calls fail fast
//! with [`NoteError::ProviderLoadFailed`] instead of reloading.

use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::discovery::find_models_dir;
use super::fastembed_provider::{FastEmbedConfig, FastEmbedProvider};
use super::hashing::HashingProvider;
use super::provider::EmbeddingProvider;
use crate::error::{NoteError, Result};

/// Blocking constructor for a provider; may be invoked again only if an
/// earlier load was cancelled before finishing
pub type ProviderLoader = Arc<dyn Fn() -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

type LoadOutcome = std::result::Result<Arc<dyn EmbeddingProvider>, String>;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for a single embed call (default: 10s)
    pub embed_timeout: Duration,
    /// Cached text->vector entries before the cache is reset (default: 4096)
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embed_timeout: Duration::from_secs(10),
            cache_capacity: 4096,
        }
    }
}

/// Vector embedding engine with caching
pub struct VectorEngine {
    loader: Option<ProviderLoader>,
    provider: OnceCell<LoadOutcome>,
    cache: DashMap<String, Vec<f32>>,
    config: EngineConfig,
}

impl VectorEngine {
    /// Create an engine that loads its provider on first use
    pub fn new(loader: ProviderLoader, config: EngineConfig) -> Self {
        Self {
            loader: Some(loader),
            provider: OnceCell::new(),
            cache: DashMap::new(),
            config,
        }
    }

    /// Create an engine around an already loaded provider
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> Self {
        Self {
            loader: None,
            provider: OnceCell::new_with(Some(Ok(provider))),
            cache: DashMap::new(),
            config,
        }
    }

    /// Engine backed by the FastEmbed AllMiniLM-L6-v2 model
    ///
    /// # Arguments
    /// * `data_dir` - Optional data directory; models are cached beneath it
    pub fn fastembed(data_dir: Option<&Path>, config: EngineConfig) -> Self {
        let fastembed_config = FastEmbedConfig::new(find_models_dir(data_dir));
        let loader: ProviderLoader = Arc::new(move || {
            let provider = FastEmbedProvider::load(fastembed_config.clone())?;
            Ok(Arc::new(provider) as Arc<dyn EmbeddingProvider>)
        });
        Self::new(loader, config)
    }

    /// Engine backed by the offline feature-hashing provider
    pub fn hashing(dimension: usize, config: EngineConfig) -> Self {
        Self::with_provider(Arc::new(HashingProvider::new(dimension)), config)
    }

    /// Get the provider, loading it on first use
    pub async fn provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let outcome = self
            .provider
            .get_or_init(|| async {
                let Some(loader) = self.loader.clone() else {
                    return Err("no provider loader configured".to_string());
                };

                log::info!("Loading embedding provider...");
                match tokio::task::spawn_blocking(move || loader()).await {
                    Ok(Ok(provider)) => {
                        log::info!(
                            "Embedding provider ready ({}, {}d)",
                            provider.model_name(),
                            provider.dimension()
                        );
                        Ok(provider)
                    }
                    Ok(Err(e)) => {
                        log::error!("{}", e);
                        Err(match e {
                            NoteError::ProviderLoadFailed(msg) => msg,
                            other => other.to_string(),
                        })
                    }
                    Err(e) => {
                        log::error!("Embedding provider loader panicked: {}", e);
                        Err(format!("loader panicked: {}", e))
                    }
                }
            })
            .await;

        outcome.clone().map_err(NoteError::provider_load_failed)
    }

    /// True once the provider loaded successfully
    pub fn is_loaded(&self) -> bool {
        matches!(self.provider.get(), Some(Ok(_)))
    }

    /// True once a provider load has failed
    pub fn load_failed(&self) -> bool {
        matches!(self.provider.get(), Some(Err(_)))
    }

    /// Generate embedding with caching
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.clone());
        }

        let provider = self.provider().await?;
        let expected = provider.dimension();
        let owned = text.to_string();
        let vector = self
            .run_blocking(move || provider.embed(&owned))
            .await?;

        if vector.len() != expected {
            return Err(NoteError::invalid_dimension(expected, vector.len()));
        }

        self.remember(text, &vector);
        Ok(vector)
    }

    /// Batch embed with caching
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|text| self.cache.get(*text).map(|v| v.clone()))
            .collect();

        let uncached: Vec<(usize, String)> = results
            .iter()
            .enumerate()
            .filter(|(_, cached)| cached.is_none())
            .map(|(i, _)| (i, texts[i].to_string()))
            .collect();

        if uncached.is_empty() {
            return Ok(results.into_iter().flatten().collect());
        }

        let provider = self.provider().await?;
        let expected = provider.dimension();
        let owned: Vec<String> = uncached.iter().map(|(_, t)| t.clone()).collect();
        let new_embeddings = self
            .run_blocking(move || {
                let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
                provider.embed_batch(&refs)
            })
            .await?;

        if new_embeddings.len() != uncached.len() {
            return Err(NoteError::provider_unavailable(format!(
                "provider returned {} vectors for {} texts",
                new_embeddings.len(),
                uncached.len()
            )));
        }

        for ((idx, text), emb) in uncached.iter().zip(new_embeddings) {
            if emb.len() != expected {
                return Err(NoteError::invalid_dimension(expected, emb.len()));
            }
            self.remember(text, &emb);
            results[*idx] = Some(emb);
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Embedding dimension (loads the provider)
    pub async fn dimension(&self) -> Result<usize> {
        Ok(self.provider().await?.dimension())
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Get configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let timeout = self.config.embed_timeout;
        match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(NoteError::provider_unavailable(format!(
                "embedding task failed: {}",
                e
            ))),
            Err(_) => Err(NoteError::provider_unavailable(format!(
                "embedding timed out after {:?}",
                timeout
            ))),
        }
    }

    fn remember(&self, text: &str, vector: &[f32]) {
        if self.config.cache_capacity == 0 {
            return;
        }
        if self.cache.len() >= self.config.cache_capacity {
            self.cache.clear();
        }
        self.cache.insert(text.to_string(), vector.to_vec());
    }
}
