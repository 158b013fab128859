//! Stickies Memory Layer
//!
//! Storage, semantic search and topic clustering for sticky notes.
//!
//! ## Features
//!
//! - **Local embeddings** - AllMiniLM-L6-v2 through fastembed, or offline feature hashing
//! - **Semantic search** - Cosine ranking with a keyword fallback when embeddings are unavailable
//! - **Clustering** - K-means over note vectors with pluggable cluster naming
//! - **RocksDB persistence** - Versioned on-disk format with in-memory caches
//!
//! ## Example
//!
//! ```ignore
//! use stickies_memory::{EngineConfig, NewNote, NoteManager, SearchConfig, VectorEngine};
//!
//! let engine = Arc::new(VectorEngine::fastembed(Some(&data_dir), EngineConfig::default()));
//! let manager = NoteManager::open(&data_dir, engine)?;
//!
//! manager.create_note(NewNote::text("Buy groceries: milk, eggs")).await?;
//! manager.wait_for_indexing().await;
//!
//! let outcome = manager.search("food shopping", &SearchConfig::default()).await?;
//! let clusters = manager.cluster_notes(5).await?;
//! ```

pub mod clustering;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod lifecycle;
pub mod manager;
pub mod migration;
pub mod note;
pub mod search;
pub mod similarity;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use clustering::{
    kmeans, Cluster, ClusterConfig, ClusterId, ClusterLabel, ClusterNamer, KMeansOutcome,
    PlaceholderNamer,
};
pub use embedding::{EmbeddingProvider, EngineConfig, HashingProvider, VectorEngine};
pub use error::{NoteError, Result};
pub use indexer::{Indexer, ReindexReport};
pub use lifecycle::{LifecyclePolicy, Transition};
pub use manager::{NoteManager, NoteStats};
pub use note::{NewNote, Note, NoteBuilder, NoteColor, NoteId, NoteSource, NoteState, NoteUpdate};
pub use search::{MatchReason, SearchConfig, SearchMode, SearchOutcome, SearchRanker, SearchResult};
pub use storage::{InMemoryNoteStore, NoteScope, NoteStore, RocksNoteStore};
