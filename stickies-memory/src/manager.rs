//! Note manager
//!
//! Facade over the store, the vector engine and the indexer. Callers (the CLI
//! or a UI layer) only talk to [`NoteManager`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::clustering::{self, Cluster, ClusterConfig, ClusterNamer, PlaceholderNamer};
use crate::embedding::VectorEngine;
use crate::error::{NoteError, Result};
use crate::indexer::{Indexer, ReindexReport};
use crate::lifecycle::{LifecyclePolicy, Transition};
use crate::note::{NewNote, Note, NoteColor, NoteId, NoteState, NoteUpdate};
use crate::search::{Corpus, SearchConfig, SearchMode, SearchOutcome, SearchRanker, SearchResult};
use crate::storage::{NoteScope, NoteStore, RocksNoteStore};

/// Store statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_notes: usize,
    pub by_state: BTreeMap<String, usize>,
    pub vectors: usize,
    pub clusters: usize,
    /// Set once the embedding provider has loaded
    pub model: Option<String>,
}

/// Note manager
///
/// Owns one [`VectorEngine`], so the embedding provider is initialized at most
/// once for the manager's lifetime. Indexing runs in background tasks; use
/// [`NoteManager::wait_for_indexing`] before shutting down.
pub struct NoteManager {
    store: Arc<dyn NoteStore>,
    engine: Arc<VectorEngine>,
    indexer: Arc<Indexer>,
    policy: LifecyclePolicy,
    namer: Arc<dyn ClusterNamer>,
    cluster_config: ClusterConfig,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl NoteManager {
    /// Create a manager over an existing store
    pub fn new(store: Arc<dyn NoteStore>, engine: Arc<VectorEngine>) -> Self {
        let indexer = Arc::new(Indexer::new(engine.clone(), store.clone()));
        Self {
            store,
            engine,
            indexer,
            policy: LifecyclePolicy::default(),
            namer: Arc::new(PlaceholderNamer),
            cluster_config: ClusterConfig::default(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Open the RocksDB store under `data_dir`
    ///
    /// # Arguments
    /// * `data_dir` - Data directory; the database lives in `<data_dir>/notes`
    /// * `engine` - Vector engine used for indexing and search
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or the database fails
    /// to open or migrate.
    pub fn open(data_dir: &Path, engine: Arc<VectorEngine>) -> Result<Self> {
        let db_dir = data_dir.join("notes");
        log::info!("Opening note store at {}", db_dir.display());
        let store = RocksNoteStore::open(&db_dir)?;
        Ok(Self::new(Arc::new(store), engine))
    }

    /// Replace the cluster namer
    pub fn with_namer(mut self, namer: Arc<dyn ClusterNamer>) -> Self {
        self.namer = namer;
        self
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cluster_config(mut self, config: ClusterConfig) -> Self {
        self.cluster_config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<VectorEngine> {
        &self.engine
    }

    // ---- notes ----

    /// Create a note at the top of the board
    ///
    /// The note gets a random color when none is given, starts in the inbox
    /// and is positioned above every existing note. Indexing starts in the
    /// background; the note is returned without waiting for it.
    ///
    /// # Arguments
    /// * `new_note` - Content, source and optional color
    pub async fn create_note(&self, new_note: NewNote) -> Result<Note> {
        let position = self
            .store
            .list_notes(NoteScope::All)?
            .iter()
            .map(|n| n.position)
            .min()
            .map_or(0, |min| min - 1);

        let color = new_note
            .color
            .unwrap_or_else(|| NoteColor::random(&mut rand::rng()));

        let mut builder = Note::builder()
            .content(new_note.content)
            .source(new_note.source)
            .color(color)
            .position(position);
        if let Some(transcript) = new_note.raw_transcript {
            builder = builder.raw_transcript(transcript);
        }
        let note = builder.build()?;

        self.store.put_note(&note)?;
        log::info!("Created note {}", note.id);

        self.track(self.indexer.spawn_index(note.clone()));
        Ok(note)
    }

    /// Get a note by ID
    ///
    /// # Errors
    /// `NotFound` when no note has this ID.
    pub async fn get_note(&self, id: &NoteId) -> Result<Note> {
        self.store
            .get_note(id)?
            .ok_or_else(|| NoteError::not_found(id))
    }

    /// Notes in manual position order
    pub async fn list_notes(&self, scope: NoteScope) -> Result<Vec<Note>> {
        self.store.list_notes(scope)
    }

    pub async fn inbox_count(&self) -> Result<usize> {
        Ok(self.store.list_notes(NoteScope::State(NoteState::Inbox))?.len())
    }

    /// Apply a partial update
    ///
    /// A content change re-indexes the note in the background.
    ///
    /// # Arguments
    /// * `id` - The note to update
    /// * `update` - Fields to change; `None` leaves a field alone
    pub async fn update_note(&self, id: &NoteId, update: NoteUpdate) -> Result<Note> {
        let mut note = self.get_note(id).await?;
        let content_changed = note.apply(update);
        self.store.put_note(&note)?;

        if content_changed {
            log::debug!("Content of note {} changed, re-indexing", id);
            self.track(self.indexer.spawn_index(note.clone()));
        }
        Ok(note)
    }

    /// Delete a note and its vector
    ///
    /// # Returns
    /// true if the note was deleted, false if it didn't exist
    pub async fn delete_note(&self, id: &NoteId) -> Result<bool> {
        let removed = self.store.delete_note(id)?;
        if removed {
            log::info!("Deleted note {}", id);
        }
        Ok(removed)
    }

    /// Set positions to the order of `ids`. Unknown IDs are skipped.
    ///
    /// # Returns
    /// Number of notes moved
    pub async fn reorder_notes(&self, ids: &[NoteId]) -> Result<usize> {
        let mut moved = 0;
        for (position, id) in ids.iter().enumerate() {
            let Some(mut note) = self.store.get_note(id)? else {
                log::debug!("Skipping unknown note {} in reorder", id);
                continue;
            };
            note.position = position as i64;
            note.touch();
            self.store.put_note(&note)?;
            moved += 1;
        }
        Ok(moved)
    }

    // ---- lifecycle ----

    pub async fn archive_note(&self, id: &NoteId) -> Result<Note> {
        self.transition(id, Transition::Archive).await
    }

    pub async fn activate_note(&self, id: &NoteId) -> Result<Note> {
        self.transition(id, Transition::Activate).await
    }

    /// Hide a note until `until`
    pub async fn snooze_note(&self, id: &NoteId, until: DateTime<Utc>) -> Result<Note> {
        self.transition(id, Transition::Snooze { until }).await
    }

    pub async fn unsnooze_note(&self, id: &NoteId) -> Result<Note> {
        self.transition(id, Transition::Unsnooze).await
    }

    async fn transition(&self, id: &NoteId, transition: Transition) -> Result<Note> {
        let mut note = self.get_note(id).await?;
        let from = note.state;
        transition.apply(&mut note);
        self.store.put_note(&note)?;
        log::debug!("Note {}: {} -> {}", id, from, note.state);
        Ok(note)
    }

    /// Move every snoozed note whose time has come back to the inbox
    ///
    /// # Returns
    /// The notes that woke up
    pub async fn process_snoozed(&self, now: DateTime<Utc>) -> Result<Vec<Note>> {
        let due: Vec<Note> = self
            .store
            .list_notes(NoteScope::State(NoteState::Snoozed))?
            .into_iter()
            .filter(|n| self.policy.is_snooze_due(n, now))
            .collect();

        let mut woken = Vec::with_capacity(due.len());
        for mut note in due {
            Transition::Unsnooze.apply(&mut note);
            self.store.put_note(&note)?;
            woken.push(note);
        }

        if !woken.is_empty() {
            log::info!("Woke {} snoozed notes", woken.len());
        }
        Ok(woken)
    }

    /// Pick a random archived note worth showing again
    pub async fn rediscovery_candidate<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<Note>> {
        let candidates: Vec<Note> = self
            .store
            .list_notes(NoteScope::State(NoteState::Archived))?
            .into_iter()
            .filter(|n| self.policy.is_rediscoverable(n, now))
            .collect();
        Ok(candidates.choose(rng).cloned())
    }

    /// Record that a note was shown for rediscovery
    pub async fn mark_surfaced(&self, id: &NoteId, now: DateTime<Utc>) -> Result<Note> {
        self.update_note(
            id,
            NoteUpdate {
                last_surfaced_at: Some(Some(now)),
                ..Default::default()
            },
        )
        .await
    }

    // ---- search ----

    /// Search notes by meaning, falling back to keywords
    ///
    /// The query is embedded once and compared with every stored vector. When
    /// no note has a vector yet, or the embedding provider fails, the notes
    /// are ranked lexically instead and the outcome is marked
    /// [`SearchMode::Lexical`].
    ///
    /// # Arguments
    /// * `query` - Free text; blank or too-short queries return nothing
    /// * `config` - Limit and filters
    ///
    /// # Errors
    /// `InvalidDimension` when stored vectors were produced by a different
    /// model than the current one; store failures.
    pub async fn search(&self, query: &str, config: &SearchConfig) -> Result<SearchOutcome> {
        if !config.accepts(query) {
            return Ok(SearchOutcome::empty(SearchMode::Semantic));
        }

        let corpus = self.corpus()?;
        if corpus.iter().all(|(_, v)| v.is_none()) {
            log::debug!("No note vectors stored, using lexical search");
            return Ok(Self::lexical(query, &corpus, config));
        }

        match self.engine.embed(query).await {
            Ok(query_vector) => Ok(SearchOutcome {
                mode: SearchMode::Semantic,
                results: SearchRanker::rank_semantic(&query_vector, &corpus, config)?,
            }),
            Err(e) if e.is_provider_failure() => {
                log::warn!("Semantic search unavailable ({}), falling back to lexical", e);
                Ok(Self::lexical(query, &corpus, config))
            }
            Err(e) => Err(e),
        }
    }

    fn lexical(query: &str, corpus: &Corpus, config: &SearchConfig) -> SearchOutcome {
        SearchOutcome {
            mode: SearchMode::Lexical,
            results: SearchRanker::rank_lexical(query, corpus, config),
        }
    }

    /// Notes most similar to a given note
    ///
    /// # Errors
    /// `NotFound` for an unknown note, `VectorNotFound` when it has not been
    /// indexed yet.
    pub async fn related_notes(&self, id: &NoteId, limit: usize) -> Result<Vec<SearchResult>> {
        self.get_note(id).await?;
        let vector = self
            .store
            .get_vector(id)?
            .ok_or_else(|| NoteError::vector_not_found(id))?;

        let corpus: Corpus = self.corpus()?.into_iter().filter(|(n, _)| n.id != *id).collect();
        let config = SearchConfig::default().with_limit(limit);
        SearchRanker::rank_semantic(&vector, &corpus, &config)
    }

    // ---- clustering ----

    /// Group notes by topic, replacing all previous clusters
    ///
    /// Only notes that already have a vector take part. Initialization is
    /// seeded from the OS, so repeated runs may group differently.
    pub async fn cluster_notes(&self, k: usize) -> Result<Vec<Cluster>> {
        let mut rng = StdRng::from_os_rng();
        self.cluster_notes_with_rng(k, &mut rng).await
    }

    /// [`cluster_notes`](Self::cluster_notes) with a caller-supplied generator
    pub async fn cluster_notes_with_rng<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Result<Vec<Cluster>> {
        let items: Vec<(Note, Vec<f32>)> = self
            .corpus()?
            .into_iter()
            .filter_map(|(note, vector)| vector.map(|v| (note, v)))
            .collect();

        let config = ClusterConfig {
            k,
            ..self.cluster_config.clone()
        };
        let clusters = clustering::cluster_notes(&items, &config, self.namer.as_ref(), rng)?;
        self.store.replace_clusters(&clusters)?;
        Ok(clusters)
    }

    /// Current cluster records
    pub async fn clusters(&self) -> Result<Vec<Cluster>> {
        self.store.list_clusters()
    }

    /// Cluster with the configured default `k`
    pub async fn cluster_default(&self) -> Result<Vec<Cluster>> {
        self.cluster_notes(self.cluster_config.k).await
    }

    // ---- indexing ----

    /// Index notes missing a vector or holding one of another dimension
    /// (all notes with `force`)
    pub async fn reindex(&self, force: bool) -> Result<ReindexReport> {
        if force {
            self.engine.clear_cache();
        }
        self.indexer.reindex_all(force).await
    }

    /// Wait for background indexing started by this manager
    pub async fn wait_for_indexing(&self) {
        let handles = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                log::warn!("Indexing task failed: {}", e);
            }
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    // ---- stats ----

    pub async fn stats(&self) -> Result<NoteStats> {
        let notes = self.store.list_notes(NoteScope::All)?;
        let mut by_state: BTreeMap<String, usize> =
            NoteState::ALL.iter().map(|s| (s.to_string(), 0)).collect();
        for note in &notes {
            *by_state.entry(note.state.to_string()).or_insert(0) += 1;
        }

        let model = if self.engine.is_loaded() {
            Some(self.engine.provider().await?.model_name().to_string())
        } else {
            None
        };

        Ok(NoteStats {
            total_notes: notes.len(),
            by_state,
            vectors: self.store.vector_count()?,
            clusters: self.store.list_clusters()?.len(),
            model,
        })
    }

    /// Snapshot of every note with its vector, in position order
    fn corpus(&self) -> Result<Corpus> {
        self.store
            .list_notes(NoteScope::All)?
            .into_iter()
            .map(|note| {
                let vector = self.store.get_vector(&note.id)?;
                Ok((note, vector))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusterLabel;
    use crate::embedding::{EngineConfig, HashingProvider};
    use crate::storage::InMemoryNoteStore;
    use crate::test_support::{failing_engine, topic_engine};
    use chrono::Duration;

    fn manager_with(engine: Arc<VectorEngine>) -> NoteManager {
        NoteManager::new(Arc::new(InMemoryNoteStore::new()), engine)
    }

    async fn add(manager: &NoteManager, content: &str) -> Note {
        manager.create_note(NewNote::text(content)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_note_lands_on_top() {
        let manager = manager_with(topic_engine());
        let first = add(&manager, "first").await;
        let second = add(&manager, "second").await;

        assert_eq!(first.position, 0);
        assert_eq!(second.position, -1);
        assert_eq!(second.state, NoteState::Inbox);

        let listed = manager.list_notes(NoteScope::All).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(manager.inbox_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_note_keeps_requested_color_and_voice() {
        let manager = manager_with(topic_engine());
        let note = manager
            .create_note(NewNote::voice("Buy bread", "uh buy bread").with_color(NoteColor::Green))
            .await
            .unwrap();

        assert_eq!(note.color, NoteColor::Green);
        assert_eq!(note.raw_transcript.as_deref(), Some("uh buy bread"));
    }

    #[tokio::test]
    async fn test_create_note_indexes_in_background() {
        let manager = manager_with(topic_engine());
        let note = add(&manager, "Buy milk").await;

        manager.wait_for_indexing().await;
        assert!(manager.store().get_vector(&note.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_note_survives_provider_failure() {
        let manager = manager_with(failing_engine());
        let note = add(&manager, "Buy milk").await;
        manager.wait_for_indexing().await;

        assert_eq!(manager.get_note(&note.id).await.unwrap(), note);
        assert_eq!(manager.store().vector_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_content_reindexes() {
        let manager = manager_with(topic_engine());
        let note = add(&manager, "Buy milk").await;
        manager.wait_for_indexing().await;
        let before = manager.store().get_vector(&note.id).unwrap().unwrap();

        let updated = manager
            .update_note(
                &note.id,
                NoteUpdate {
                    content: Some("Quarterly report".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        manager.wait_for_indexing().await;

        assert_eq!(updated.content, "Quarterly report");
        assert_ne!(manager.store().get_vector(&note.id).unwrap().unwrap(), before);
        assert_eq!(manager.store().vector_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_note_is_not_found() {
        let manager = manager_with(topic_engine());
        let err = manager.archive_note(&NoteId::new()).await.unwrap_err();
        assert!(matches!(err, NoteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let manager = manager_with(topic_engine());
        let note = add(&manager, "Call mom").await;
        let until = Utc::now() + Duration::hours(2);

        let snoozed = manager.snooze_note(&note.id, until).await.unwrap();
        assert_eq!(snoozed.state, NoteState::Snoozed);
        assert_eq!(snoozed.snoozed_until, Some(until));

        let active = manager.activate_note(&note.id).await.unwrap();
        assert_eq!(active.state, NoteState::Active);
        assert!(active.snoozed_until.is_none());

        let archived = manager.archive_note(&note.id).await.unwrap();
        assert_eq!(archived.state, NoteState::Archived);

        let inbox = manager.unsnooze_note(&note.id).await.unwrap();
        assert_eq!(inbox.state, NoteState::Inbox);
    }

    #[tokio::test]
    async fn test_process_snoozed() {
        let manager = manager_with(topic_engine());
        let now = Utc::now();
        let due = add(&manager, "due").await;
        let later = add(&manager, "later").await;
        manager.snooze_note(&due.id, now - Duration::minutes(1)).await.unwrap();
        manager.snooze_note(&later.id, now + Duration::hours(1)).await.unwrap();

        let woken = manager.process_snoozed(now).await.unwrap();
        assert_eq!(woken.len(), 1);
        assert_eq!(woken[0].id, due.id);
        assert_eq!(woken[0].state, NoteState::Inbox);
        assert!(woken[0].snoozed_until.is_none());

        let still = manager.get_note(&later.id).await.unwrap();
        assert_eq!(still.state, NoteState::Snoozed);
    }

    #[tokio::test]
    async fn test_rediscovery_candidate() {
        let manager = manager_with(topic_engine());
        let note = add(&manager, "old idea").await;
        manager.archive_note(&note.id).await.unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        // Archived just now: too fresh
        let now = Utc::now();
        assert!(manager.rediscovery_candidate(now, &mut rng).await.unwrap().is_none());

        let later = now + Duration::days(4);
        let candidate = manager.rediscovery_candidate(later, &mut rng).await.unwrap();
        assert_eq!(candidate.map(|n| n.id), Some(note.id));

        // Surfacing resets the clock on both thresholds
        manager.mark_surfaced(&note.id, Utc::now()).await.unwrap();
        assert!(manager.rediscovery_candidate(later, &mut rng).await.unwrap().is_none());
        let much_later = now + Duration::days(8);
        assert!(manager.rediscovery_candidate(much_later, &mut rng).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reorder_notes() {
        let manager = manager_with(topic_engine());
        let a = add(&manager, "a").await;
        let b = add(&manager, "b").await;
        let c = add(&manager, "c").await;

        let moved = manager.reorder_notes(&[a.id, NoteId::new(), c.id, b.id]).await.unwrap();
        assert_eq!(moved, 3);

        let order: Vec<NoteId> = manager
            .list_notes(NoteScope::All)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(order, vec![a.id, c.id, b.id]);
    }

    #[tokio::test]
    async fn test_search_ranks_by_topic() {
        let manager = manager_with(topic_engine());
        add(&manager, "Buy groceries: milk, eggs").await;
        add(&manager, "Finish quarterly report").await;
        add(&manager, "Book dentist appointment").await;
        manager.wait_for_indexing().await;

        let outcome = manager.search("food shopping", &SearchConfig::default()).await.unwrap();
        assert_eq!(outcome.mode, SearchMode::Semantic);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results[0].note.content, "Buy groceries: milk, eggs");
    }

    #[tokio::test]
    async fn test_blank_query_skips_provider() {
        let manager = manager_with(failing_engine());
        add(&manager, "anything").await;
        manager.wait_for_indexing().await;

        let outcome = manager.search("   ", &SearchConfig::default()).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_search_falls_back_to_lexical() {
        let manager = manager_with(failing_engine());
        add(&manager, "Finish quarterly report").await;
        add(&manager, "Buy milk and eggs").await;
        manager.wait_for_indexing().await;

        let outcome = manager.search("quarterly report", &SearchConfig::default()).await.unwrap();
        assert_eq!(outcome.mode, SearchMode::Lexical);
        assert_eq!(outcome.results.len(), 1);
        assert!((outcome.results[0].score - 1.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_falls_back_when_provider_fails() {
        let store: Arc<dyn NoteStore> = Arc::new(InMemoryNoteStore::new());
        let note = Note::builder().content("Buy milk").build().unwrap();
        store.put_note(&note).unwrap();
        store.put_vector(&note.id, &[1.0, 0.0]).unwrap();

        let manager = NoteManager::new(store, failing_engine());
        let outcome = manager.search("milk", &SearchConfig::default()).await.unwrap();
        assert_eq!(outcome.mode, SearchMode::Lexical);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].mode(), SearchMode::Lexical);
    }

    #[tokio::test]
    async fn test_search_with_mixed_dimensions_fails() {
        let store: Arc<dyn NoteStore> = Arc::new(InMemoryNoteStore::new());
        let note = Note::builder().content("Buy milk").build().unwrap();
        store.put_note(&note).unwrap();
        store.put_vector(&note.id, &[1.0, 0.0]).unwrap();

        let engine = Arc::new(VectorEngine::with_provider(
            Arc::new(HashingProvider::new(8)),
            EngineConfig::default(),
        ));
        let manager = NoteManager::new(store, engine);
        let err = manager.search("milk", &SearchConfig::default()).await.unwrap_err();
        assert!(matches!(err, NoteError::InvalidDimension { .. }));
    }

    #[tokio::test]
    async fn test_related_notes() {
        let manager = manager_with(topic_engine());
        let milk = add(&manager, "Buy milk").await;
        add(&manager, "Buy eggs and bread").await;
        add(&manager, "Quarterly report").await;
        manager.wait_for_indexing().await;

        let related = manager.related_notes(&milk.id, 5).await.unwrap();
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|r| r.note.id != milk.id));
        assert_eq!(related[0].note.content, "Buy eggs and bread");
    }

    #[tokio::test]
    async fn test_related_notes_without_vector() {
        let manager = manager_with(failing_engine());
        let note = add(&manager, "Buy milk").await;
        manager.wait_for_indexing().await;

        let err = manager.related_notes(&note.id, 5).await.unwrap_err();
        assert!(matches!(err, NoteError::VectorNotFound(_)));
    }

    #[tokio::test]
    async fn test_cluster_notes_by_topic() {
        let manager = manager_with(topic_engine());
        let groceries = [add(&manager, "Buy milk").await, add(&manager, "Buy eggs").await];
        let work = [add(&manager, "Quarterly report").await, add(&manager, "Team meeting").await];
        manager.wait_for_indexing().await;

        let mut rng = StdRng::seed_from_u64(11);
        let clusters = manager.cluster_notes_with_rng(2, &mut rng).await.unwrap();
        assert_eq!(clusters.len(), 2);

        for cluster in &clusters {
            let in_groceries = cluster.note_ids.iter().filter(|id| groceries.iter().any(|n| n.id == **id)).count();
            let in_work = cluster.note_ids.iter().filter(|id| work.iter().any(|n| n.id == **id)).count();
            assert!(
                (in_groceries == 2 && in_work == 0) || (in_groceries == 0 && in_work == 2),
                "mixed cluster: {:?}",
                cluster
            );
        }
        assert_eq!(manager.clusters().await.unwrap(), clusters);
    }

    #[tokio::test]
    async fn test_cluster_without_vectors_clears_clusters() {
        let store: Arc<dyn NoteStore> = Arc::new(InMemoryNoteStore::new());
        let note = Note::builder().content("Buy milk").build().unwrap();
        store.put_note(&note).unwrap();
        let stale = clustering::build_clusters(
            vec![vec![note.id]],
            &Default::default(),
            &PlaceholderNamer,
            Utc::now(),
        );
        store.replace_clusters(&stale).unwrap();

        let manager = NoteManager::new(store, failing_engine());
        assert!(manager.cluster_notes(3).await.unwrap().is_empty());
        assert!(manager.clusters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cluster_zero_k_is_rejected() {
        let manager = manager_with(topic_engine());
        add(&manager, "Buy milk").await;
        manager.wait_for_indexing().await;

        let err = manager.cluster_notes(0).await.unwrap_err();
        assert!(matches!(err, NoteError::InvalidClusterCount(0)));
    }

    #[tokio::test]
    async fn test_cluster_namer_is_used() {
        struct FirstWord;
        impl ClusterNamer for FirstWord {
            fn label(&self, _index: usize, members: &[&Note]) -> ClusterLabel {
                let word = members
                    .first()
                    .and_then(|n| n.content.split_whitespace().next())
                    .unwrap_or("Empty");
                ClusterLabel {
                    name: word.to_string(),
                    description: Some(format!("{} notes", members.len())),
                }
            }
        }

        let manager = manager_with(topic_engine()).with_namer(Arc::new(FirstWord));
        add(&manager, "Groceries list").await;
        manager.wait_for_indexing().await;

        let clusters = manager.cluster_notes(3).await.unwrap();
        assert_eq!(clusters[0].name, "Groceries");
        assert_eq!(clusters[0].description.as_deref(), Some("1 notes"));
    }

    #[tokio::test]
    async fn test_delete_note_cascades() {
        let manager = manager_with(topic_engine());
        let note = add(&manager, "Buy milk").await;
        manager.wait_for_indexing().await;

        assert!(manager.delete_note(&note.id).await.unwrap());
        assert!(!manager.delete_note(&note.id).await.unwrap());
        assert_eq!(manager.store().vector_count().unwrap(), 0);

        let outcome = manager.search("milk", &SearchConfig::default()).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_reindex_after_provider_switch_restores_search() {
        let store = Arc::new(InMemoryNoteStore::new());
        let note = Note::builder().content("Buy milk and eggs").build().unwrap();
        store.put_note(&note).unwrap();
        store.put_vector(&note.id, &[0.6, 0.8]).unwrap();

        let engine = Arc::new(VectorEngine::hashing(32, EngineConfig::default()));
        let manager = NoteManager::new(store, engine);
        let err = manager.search("milk", &SearchConfig::default()).await.unwrap_err();
        assert!(matches!(err, NoteError::InvalidDimension { .. }));

        let report = manager.reindex(false).await.unwrap();
        assert_eq!(report.indexed, 1);

        let outcome = manager.search("milk", &SearchConfig::default()).await.unwrap();
        assert_eq!(outcome.mode, SearchMode::Semantic);
        assert_eq!(outcome.results[0].note.id, note.id);
    }

    #[tokio::test]
    async fn test_stats() {
        let manager = manager_with(topic_engine());
        let note = add(&manager, "Buy milk").await;
        add(&manager, "Quarterly report").await;
        manager.archive_note(&note.id).await.unwrap();
        manager.wait_for_indexing().await;

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.total_notes, 2);
        assert_eq!(stats.by_state["archived"], 1);
        assert_eq!(stats.by_state["inbox"], 1);
        assert_eq!(stats.by_state["snoozed"], 0);
        assert_eq!(stats.vectors, 2);
        assert_eq!(stats.model.as_deref(), Some("topics"));
    }
}
