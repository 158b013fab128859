#![allow(dead_code)]

use std::sync::Arc;

use stickies_memory::embedding::ProviderLoader;
use stickies_memory::similarity::normalize;
use stickies_memory::{EmbeddingProvider, EngineConfig, NoteError, NoteManager, Result, VectorEngine};
use tempfile::TempDir;

const TOPICS: &[&[&str]] = &[
    &["grocer", "milk", "eggs", "bread", "food", "shopping"],
    &["report", "meeting", "quarterly", "deadline", "project"],
    &["doctor", "dentist", "gym", "medicine"],
];

/// Maps text onto a few keyword topics, so related wording lands together
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

pub fn broken_engine() -> Arc<VectorEngine> {
    let loader: ProviderLoader = Arc::new(|| -> Result<Arc<dyn EmbeddingProvider>> {
        Err(NoteError::provider_load_failed("onnx runtime missing"))
    });
    Arc::new(VectorEngine::new(loader, EngineConfig::default()))
}

/// Manager over a fresh RocksDB directory
pub fn open_manager(engine: Arc<VectorEngine>) -> (TempDir, NoteManager) {
    let dir = TempDir::new().expect("temp dir");
    let manager = NoteManager::open(dir.path(), engine).expect("open manager");
    (dir, manager)
}
