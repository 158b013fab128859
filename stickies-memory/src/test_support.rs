//! Shared helpers for unit tests

use std::sync::Arc;

use crate::embedding::{EmbeddingProvider, EngineConfig, ProviderLoader, VectorEngine};
use crate::error::{NoteError, Result};
use crate::similarity::normalize;

/// Keyword buckets standing in for semantic topics
const TOPICS: &[&[&str]] = &[
    &["grocer", "milk", "eggs", "bread", "food", "shopping", "supermarket"],
    &["report", "meeting", "quarterly", "email", "deadline", "project"],
    &["doctor", "dentist", "gym", "run", "medicine"],
    &["dog", "laundry", "clean", "rent", "plumber"],
];

/// One dimension per topic plus a constant bias so no vector is zero
pub struct TopicProvider;

impl EmbeddingProvider for TopicProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = TOPICS
            .iter()
            .map(|words| words.iter().filter(|w| text.contains(*w)).count() as f32)
            .collect();
        vector.push(0.1);
        normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        TOPICS.len() + 1
    }

    fn model_name(&self) -> &str {
        "topics"
    }
}

pub fn topic_engine() -> Arc<VectorEngine> {
    Arc::new(VectorEngine::with_provider(Arc::new(TopicProvider), EngineConfig::default()))
}

pub fn failing_engine() -> Arc<VectorEngine> {
    let loader: ProviderLoader = Arc::new(|| -> Result<Arc<dyn EmbeddingProvider>> {
        Err(NoteError::provider_load_failed("model files missing"))
    });
    Arc::new(VectorEngine::new(loader, EngineConfig::default()))
}
