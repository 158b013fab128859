//! RocksDB-backed note store
//!
//! Key layout:
//! - `note:{id}`: bincode [`Note`]
//! - `vec:{id}`: raw little-endian f32 (see [`codec`](super::codec))
//! - `cluster:{id}`: JSON [`Cluster`]
//! - `_db_version`: u32 little-endian
//!
//! Everything is loaded into memory on open; reads are served from the caches.

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::codec::{decode_vector, encode_vector, VECTOR_ENCODING_VERSION};
use super::{apply_pruned, number_clusters, prune_clusters, sort_clusters, sort_notes, NoteScope, NoteStore};
use crate::clustering::Cluster;
use crate::error::{NoteError, Result};
use crate::migration::{self, DB_VERSION_KEY};
use crate::note::{Note, NoteId};

const NOTE_PREFIX: &str = "note:";
const VECTOR_PREFIX: &str = "vec:";
const CLUSTER_PREFIX: &str = "cluster:";

fn note_key(id: &NoteId) -> String {
    format!("{}{}", NOTE_PREFIX, id)
}

fn vector_key(id: &NoteId) -> String {
    format!("{}{}", VECTOR_PREFIX, id)
}

fn cluster_key(cluster: &Cluster) -> String {
    format!("{}{}", CLUSTER_PREFIX, cluster.id)
}

/// RocksDB-based note store
pub struct RocksNoteStore {
    db: Arc<DB>,
    note_cache: DashMap<NoteId, Note>,
    vector_cache: DashMap<NoteId, Vec<f32>>,
    clusters: RwLock<Vec<Cluster>>,
    /// Serializes vector upserts against deletes
    write_lock: Mutex<()>,
}

impl RocksNoteStore {
    /// Open (or create) a store at the given path, migrating older formats
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        migration::migrate_if_needed(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_background_jobs(2);
        opts.set_bytes_per_sync(1048576); // 1MB
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;
        if db.get(DB_VERSION_KEY)?.is_none() {
            db.put(DB_VERSION_KEY, VECTOR_ENCODING_VERSION.to_le_bytes())?;
        }

        log::info!("Note store opened at: {}", path.display());

        let store = Self {
            db: Arc::new(db),
            note_cache: DashMap::new(),
            vector_cache: DashMap::new(),
            clusters: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
        };

        store.load_cache()?;
        Ok(store)
    }

    /// Load notes, vectors and clusters into memory
    fn load_cache(&self) -> Result<()> {
        let mut skipped = 0;
        let mut vectors = Vec::new();
        let mut clusters = Vec::new();

        for item in self.db.iterator(IteratorMode::Start) {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);

            if let Some(id) = key_str.strip_prefix(NOTE_PREFIX) {
                match bincode::deserialize::<Note>(&value) {
                    Ok(note) => {
                        self.note_cache.insert(note.id, note);
                    }
                    Err(e) => {
                        log::warn!("Failed to deserialize note {}: {}. Skipping.", id, e);
                        skipped += 1;
                    }
                }
            } else if let Some(id) = key_str.strip_prefix(VECTOR_PREFIX) {
                match (NoteId::from_str(id), decode_vector(&value)) {
                    (Ok(id), Ok(vector)) => vectors.push((id, vector)),
                    (Err(e), _) => log::warn!("Invalid vector key {}: {}. Skipping.", key_str, e),
                    (_, Err(e)) => log::warn!("Failed to decode vector {}: {}. Skipping.", id, e),
                }
            } else if key_str.starts_with(CLUSTER_PREFIX) {
                match serde_json::from_slice::<Cluster>(&value) {
                    Ok(cluster) => clusters.push(cluster),
                    Err(e) => log::warn!("Failed to deserialize {}: {}. Skipping.", key_str, e),
                }
            }
        }

        // Vectors are only kept for notes that exist
        for (id, vector) in vectors {
            if self.note_cache.contains_key(&id) {
                self.vector_cache.insert(id, vector);
            } else {
                log::warn!("Dropping orphan vector for missing note {}", id);
                self.db.delete(vector_key(&id).as_bytes())?;
            }
        }

        sort_clusters(&mut clusters);
        *self.clusters.write() = clusters;

        if !self.note_cache.is_empty() {
            log::info!(
                "Loaded {} notes ({} with vectors) from disk",
                self.note_cache.len(),
                self.vector_cache.len()
            );
        }
        if skipped > 0 {
            log::warn!("Skipped {} notes due to deserialization errors", skipped);
        }

        Ok(())
    }
}

impl NoteStore for RocksNoteStore {
    fn put_note(&self, note: &Note) -> Result<()> {
        self.db
            .put(note_key(&note.id).as_bytes(), bincode::serialize(note)?)?;
        self.note_cache.insert(note.id, note.clone());
        self.db.flush()?;
        Ok(())
    }

    fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.note_cache.get(id).map(|e| e.clone()))
    }

    fn delete_note(&self, id: &NoteId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut clusters = self.clusters.write();

        let pruned = prune_clusters(&clusters, id);

        let mut batch = WriteBatch::default();
        batch.delete(note_key(id).as_bytes());
        batch.delete(vector_key(id).as_bytes());
        for cluster in &pruned {
            if cluster.note_ids.is_empty() {
                batch.delete(cluster_key(cluster).as_bytes());
            } else {
                batch.put(cluster_key(cluster).as_bytes(), serde_json::to_vec(cluster)?);
            }
        }
        self.db.write(batch)?;
        self.db.flush()?;

        let removed = self.note_cache.remove(id).is_some();
        self.vector_cache.remove(id);
        apply_pruned(&mut clusters, pruned);

        Ok(removed)
    }

    fn list_notes(&self, scope: NoteScope) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .note_cache
            .iter()
            .filter(|e| scope.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        sort_notes(&mut notes);
        Ok(notes)
    }

    fn get_vector(&self, id: &NoteId) -> Result<Option<Vec<f32>>> {
        Ok(self.vector_cache.get(id).map(|e| e.clone()))
    }

    fn put_vector(&self, id: &NoteId, vector: &[f32]) -> Result<()> {
        let _guard = self.write_lock.lock();
        if !self.note_cache.contains_key(id) {
            return Err(NoteError::not_found(id));
        }

        self.db
            .put(vector_key(id).as_bytes(), encode_vector(vector))?;
        self.vector_cache.insert(*id, vector.to_vec());
        Ok(())
    }

    fn vector_count(&self) -> Result<usize> {
        Ok(self.vector_cache.len())
    }

    fn list_clusters(&self) -> Result<Vec<Cluster>> {
        Ok(self.clusters.read().clone())
    }

    fn replace_clusters(&self, clusters: &[Cluster]) -> Result<()> {
        let mut current = self.clusters.write();

        let replaced = number_clusters(clusters);

        let mut batch = WriteBatch::default();
        for old in current.iter() {
            batch.delete(cluster_key(old).as_bytes());
        }
        for cluster in &replaced {
            batch.put(cluster_key(cluster).as_bytes(), serde_json::to_vec(cluster)?);
        }
        self.db.write(batch)?;
        self.db.flush()?;

        *current = replaced;
        Ok(())
    }
}
