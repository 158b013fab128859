//! Note and vector persistence
//!
//! [`NoteStore`] is the seam between the manager and a backend. Two backends
//! ship: [`RocksNoteStore`] (RocksDB with LZ4 compression and in-memory
//! caches) and [`InMemoryNoteStore`] (tests and ephemeral sessions).
//!
//! Both keep the same guarantees:
//! - a vector is only stored for a note that exists
//! - deleting a note removes its vector and its cluster memberships
//! - cluster replacement is all-or-nothing

pub mod codec;
mod memory;
mod rocks;

pub use memory::InMemoryNoteStore;
pub use rocks::RocksNoteStore;

use crate::clustering::Cluster;
use crate::error::Result;
use crate::note::{Note, NoteId, NoteState};

/// Which notes to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteScope {
    #[default]
    All,
    State(NoteState),
}

impl NoteScope {
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            Self::All => true,
            Self::State(state) => note.state == *state,
        }
    }
}

/// Persistent storage for notes, their vectors and cluster records
pub trait NoteStore: Send + Sync {
    /// Insert or replace a note
    fn put_note(&self, note: &Note) -> Result<()>;

    fn get_note(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Delete a note with its vector. Returns whether the note existed.
    fn delete_note(&self, id: &NoteId) -> Result<bool>;

    /// Notes ordered by position, then creation time
    fn list_notes(&self, scope: NoteScope) -> Result<Vec<Note>>;

    fn get_vector(&self, id: &NoteId) -> Result<Option<Vec<f32>>>;

    /// Upsert the vector for an existing note (`NotFound` otherwise)
    fn put_vector(&self, id: &NoteId, vector: &[f32]) -> Result<()>;

    fn vector_count(&self) -> Result<usize>;

    fn list_clusters(&self) -> Result<Vec<Cluster>>;

    /// Atomically replace every cluster record
    fn replace_clusters(&self, clusters: &[Cluster]) -> Result<()>;
}

/// Position order shared by both backends
pub(crate) fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Drop a deleted note from cluster memberships.
/// Returns the clusters that changed.
pub(crate) fn prune_clusters(clusters: &[Cluster], id: &NoteId) -> Vec<Cluster> {
    clusters
        .iter()
        .filter(|c| c.contains(id))
        .map(|c| {
            let mut cluster = c.clone();
            cluster.note_ids.retain(|n| n != id);
            cluster
        })
        .collect()
}

/// Swap pruned clusters into the list, dropping ones left without members
pub(crate) fn apply_pruned(clusters: &mut Vec<Cluster>, pruned: Vec<Cluster>) {
    for cluster in pruned {
        if let Some(slot) = clusters.iter_mut().find(|c| c.id == cluster.id) {
            *slot = cluster;
        }
    }
    clusters.retain(|c| !c.note_ids.is_empty());
}

/// Copy of `clusters` with each ordinal set to its slice index
pub(crate) fn number_clusters(clusters: &[Cluster]) -> Vec<Cluster> {
    clusters
        .iter()
        .enumerate()
        .map(|(ordinal, cluster)| Cluster {
            ordinal,
            ..cluster.clone()
        })
        .collect()
}

/// Order clusters as they were stored
pub(crate) fn sort_clusters(clusters: &mut [Cluster]) {
    clusters.sort_by_key(|c| c.ordinal);
}
