//! In-memory note store

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use super::{apply_pruned, number_clusters, prune_clusters, sort_notes, NoteScope, NoteStore};
use crate::clustering::Cluster;
use crate::error::{NoteError, Result};
use crate::note::{Note, NoteId};

/// Volatile store with the same semantics as [`RocksNoteStore`](super::RocksNoteStore)
#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: DashMap<NoteId, Note>,
    vectors: DashMap<NoteId, Vec<f32>>,
    clusters: RwLock<Vec<Cluster>>,
    write_lock: Mutex<()>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for InMemoryNoteStore {
    fn put_note(&self, note: &Note) -> Result<()> {
        self.notes.insert(note.id, note.clone());
        Ok(())
    }

    fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.notes.get(id).map(|e| e.clone()))
    }

    fn delete_note(&self, id: &NoteId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let removed = self.notes.remove(id).is_some();
        self.vectors.remove(id);

        let mut clusters = self.clusters.write();
        let pruned = prune_clusters(&clusters, id);
        apply_pruned(&mut clusters, pruned);

        Ok(removed)
    }

    fn list_notes(&self, scope: NoteScope) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|e| scope.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        sort_notes(&mut notes);
        Ok(notes)
    }

    fn get_vector(&self, id: &NoteId) -> Result<Option<Vec<f32>>> {
        Ok(self.vectors.get(id).map(|e| e.clone()))
    }

    fn put_vector(&self, id: &NoteId, vector: &[f32]) -> Result<()> {
        let _guard = self.write_lock.lock();
        if !self.notes.contains_key(id) {
            return Err(NoteError::not_found(id));
        }
        self.vectors.insert(*id, vector.to_vec());
        Ok(())
    }

    fn vector_count(&self) -> Result<usize> {
        Ok(self.vectors.len())
    }

    fn list_clusters(&self) -> Result<Vec<Cluster>> {
        Ok(self.clusters.read().clone())
    }

    fn replace_clusters(&self, clusters: &[Cluster]) -> Result<()> {
        *self.clusters.write() = number_clusters(clusters);
        Ok(())
    }
}
