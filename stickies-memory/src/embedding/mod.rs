//! Embedding module for semantic search
//!
//! Providers turn note text into fixed-length, unit-normalized vectors.
//! [`VectorEngine`] loads a provider once per process and wraps every call
//! with a timeout.

mod discovery;
mod engine;
mod fastembed_provider;
mod hashing;
mod provider;

pub use discovery::{find_models_dir, MODELS_PATH_ENV};
pub use engine::{EngineConfig, ProviderLoader, VectorEngine};
pub use fastembed_provider::{FastEmbedConfig, FastEmbedProvider};
pub use hashing::{HashingProvider, DEFAULT_HASH_DIMENSION};
pub use provider::EmbeddingProvider;
