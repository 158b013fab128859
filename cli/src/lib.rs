//! Stickies command-line front end
//!
//! Parses arguments, builds the embedding engine and note manager, and turns
//! manager results into camelCase JSON for stdout.

pub mod commands;
pub mod dto;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stickies_memory::embedding::DEFAULT_HASH_DIMENSION;
use stickies_memory::{EngineConfig, VectorEngine};

pub use commands::{run, Command};

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// AllMiniLM-L6-v2 through fastembed (downloads the model on first use)
    Fastembed,
    /// Offline FNV-1a feature hashing
    Hash,
}

#[derive(Debug, Parser)]
#[command(name = "stickies")]
#[command(about = "Sticky notes with semantic search and topic clustering")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the note database and model cache
    #[arg(long, env = "STICKIES_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::Fastembed, env = "STICKIES_EMBEDDER")]
    pub embedder: EmbedderKind,

    /// Vector dimension for the hash embedder
    #[arg(long, default_value_t = DEFAULT_HASH_DIMENSION)]
    pub hash_dim: usize,

    /// Per-call embedding timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// `--data-dir`, or `~/.stickies/data`
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            embed_timeout: Duration::from_secs(self.timeout_secs),
            ..EngineConfig::default()
        }
    }

    pub fn build_engine(&self) -> Arc<VectorEngine> {
        let data_dir = self.resolve_data_dir();
        let engine = match self.embedder {
            EmbedderKind::Fastembed => VectorEngine::fastembed(Some(&data_dir), self.engine_config()),
            EmbedderKind::Hash => VectorEngine::hashing(self.hash_dim, self.engine_config()),
        };
        Arc::new(engine)
    }
}

pub fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stickies")
        .join("data")
}
