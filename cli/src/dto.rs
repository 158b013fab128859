//! JSON shapes printed by the CLI

use chrono::{DateTime, Utc};
use serde::Serialize;
use stickies_memory::{Cluster, MatchReason, Note, SearchMode, SearchOutcome, SearchResult};

/// A note as printed by `add`, `show`, `list` and friends.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub content: String,
    pub state: String,
    pub color: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_transcript: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_surfaced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<String>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.to_string(),
            content: note.content,
            state: note.state.to_string(),
            color: note.color.to_string(),
            source: match note.source {
                stickies_memory::NoteSource::Text => "text".into(),
                stickies_memory::NoteSource::Voice => "voice".into(),
            },
            raw_transcript: note.raw_transcript,
            position: note.position,
            created_at: note.created_at,
            updated_at: note.updated_at,
            snoozed_until: note.snoozed_until,
            last_surfaced_at: note.last_surfaced_at,
            linked_to: note.linked_to.map(|id| id.to_string()),
        }
    }
}

/// A single search hit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub state: String,
    pub score: f32,
    pub match_reason: MatchReason,
}

impl From<SearchResult> for SearchHit {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.note.id.to_string(),
            content: result.note.content,
            state: result.note.state.to_string(),
            score: result.score,
            match_reason: result.match_reason,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// "semantic", or "lexical" when embeddings were unavailable
    pub mode: SearchMode,
    pub results: Vec<SearchHit>,
    pub total: usize,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        let results: Vec<SearchHit> = outcome.results.into_iter().map(SearchHit::from).collect();
        Self {
            mode: outcome.mode,
            total: results.len(),
            results,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub note_ids: Vec<String>,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Cluster> for ClusterResponse {
    fn from(cluster: Cluster) -> Self {
        Self {
            id: cluster.id.to_string(),
            name: cluster.name,
            description: cluster.description,
            size: cluster.note_ids.len(),
            note_ids: cluster.note_ids.iter().map(|id| id.to_string()).collect(),
            created_at: cluster.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    pub moved: usize,
}
