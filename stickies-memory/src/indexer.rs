//! Embedding indexing flow
//!
//! Embeds a note's content and upserts the vector under the note id. Work for
//! one note is serialized behind a per-note async lock, and each run reads the
//! note's latest content from the store, so the vector always ends up matching
//! what was stored last.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::embedding::VectorEngine;
use crate::error::{NoteError, Result};
use crate::note::{Note, NoteId};
use crate::storage::{NoteScope, NoteStore};

/// Counts from a bulk re-index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Indexer {
    engine: Arc<VectorEngine>,
    store: Arc<dyn NoteStore>,
    locks: DashMap<NoteId, Arc<Mutex<()>>>,
}

impl Indexer {
    pub fn new(engine: Arc<VectorEngine>, store: Arc<dyn NoteStore>) -> Self {
        Self {
            engine,
            store,
            locks: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &Arc<VectorEngine> {
        &self.engine
    }

    /// Embed the note and store its vector.
    ///
    /// A note deleted before its vector is written is skipped silently.
    pub async fn index_note(&self, note: &Note) -> Result<()> {
        let id = note.id;
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.index_locked(note).await
        };
        drop(lock);
        self.locks.remove_if(&id, |_, l| Arc::strong_count(l) == 1);
        result
    }

    async fn index_locked(&self, note: &Note) -> Result<()> {
        let current = match self.store.get_note(&note.id)? {
            Some(current) => current,
            None => {
                log::debug!("Note {} deleted before indexing, skipping", note.id);
                return Ok(());
            }
        };

        let vector = self.engine.embed(&current.content).await?;
        match self.store.put_vector(&current.id, &vector) {
            Ok(()) => {
                log::debug!("Indexed note {} ({} dims)", current.id, vector.len());
                Ok(())
            }
            Err(NoteError::NotFound(_)) => {
                log::debug!("Note {} deleted while indexing, dropping vector", current.id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Index in the background. Failures are logged, never returned.
    pub fn spawn_index(self: &Arc<Self>, note: Note) -> JoinHandle<()> {
        let indexer = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = indexer.index_note(&note).await {
                log::warn!("Failed to index note {}: {}", note.id, e);
            }
        })
    }

    /// Index every note without a vector or with a vector from a provider of
    /// another dimension. Every note is indexed when `force` is set.
    ///
    /// Stops early once the provider is known to be unusable.
    pub async fn reindex_all(&self, force: bool) -> Result<ReindexReport> {
        let mut report = ReindexReport::default();
        let notes = self.store.list_notes(NoteScope::All)?;

        // None when the provider cannot load; stored vectors are then kept
        let dimension = match self.engine.dimension().await {
            Ok(dimension) => Some(dimension),
            Err(e) if e.is_provider_failure() => None,
            Err(e) => return Err(e),
        };

        for note in &notes {
            if !force {
                let current = match (self.store.get_vector(&note.id)?, dimension) {
                    (Some(vector), Some(dimension)) => vector.len() == dimension,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if current {
                    report.skipped += 1;
                    continue;
                }
            }

            match self.index_note(note).await {
                Ok(()) => report.indexed += 1,
                Err(e) if matches!(e, NoteError::ProviderLoadFailed(_)) => {
                    log::error!("Re-index aborted: {}", e);
                    report.failed += notes.len() - report.indexed - report.skipped;
                    return Ok(report);
                }
                Err(e) if e.is_provider_failure() => {
                    log::warn!("Failed to index note {}: {}", note.id, e);
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Re-index finished: {} indexed, {} skipped, {} failed",
            report.indexed,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    fn lock_for(&self, id: NoteId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
