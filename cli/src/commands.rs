//! Subcommands and their dispatch

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use stickies_memory::{
    NewNote, NoteColor, NoteId, NoteManager, NoteScope, NoteState, NoteUpdate, SearchConfig,
};

use crate::dto::{
    ClusterResponse, DeleteResponse, NoteResponse, ReorderResponse, SearchHit, SearchResponse,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capture a new note into the inbox
    Add {
        content: String,
        /// Color tag; random when omitted
        #[arg(long)]
        color: Option<NoteColor>,
        /// Mark the note as voice-captured
        #[arg(long)]
        voice: bool,
        /// Raw transcript for voice notes (defaults to the content)
        #[arg(long, requires = "voice")]
        transcript: Option<String>,
    },
    /// List notes in display order
    List {
        #[arg(long)]
        state: Option<NoteState>,
    },
    Show {
        id: NoteId,
    },
    /// Replace a note's content and re-index it
    Edit {
        id: NoteId,
        content: String,
    },
    Archive {
        id: NoteId,
    },
    Activate {
        id: NoteId,
    },
    Snooze {
        id: NoteId,
        #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(i64).range(1..))]
        hours: i64,
    },
    Unsnooze {
        id: NoteId,
    },
    Delete {
        id: NoteId,
    },
    /// Reassign display positions in the given order
    Reorder {
        #[arg(required = true)]
        ids: Vec<NoteId>,
    },
    /// Search by meaning, or by keywords when embeddings are unavailable
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Context-panel preset (3 results, archived only above 0.8)
        #[arg(long)]
        context: bool,
    },
    /// Notes closest to the given one
    Related {
        id: NoteId,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Recompute topic clusters
    Cluster {
        #[arg(long)]
        k: Option<usize>,
    },
    /// Show the stored clusters
    Clusters,
    /// Embed notes without a current vector (all notes with --force)
    Reindex {
        #[arg(long)]
        force: bool,
    },
    /// Move notes whose snooze has expired back to the inbox
    Wake,
    /// Pick an archived note to resurface
    Rediscover {
        /// Record the note as surfaced now
        #[arg(long)]
        mark: bool,
    },
    Stats,
}

fn note_json(note: stickies_memory::Note) -> Result<Value> {
    Ok(serde_json::to_value(NoteResponse::from(note))?)
}

/// Run one command against the manager and return its JSON output
pub async fn run(manager: &NoteManager, command: Command) -> Result<Value> {
    match command {
        Command::Add {
            content,
            color,
            voice,
            transcript,
        } => {
            let mut new_note = if voice {
                let transcript = transcript.unwrap_or_else(|| content.clone());
                NewNote::voice(content, transcript)
            } else {
                NewNote::text(content)
            };
            new_note.color = color;

            let note = manager.create_note(new_note).await.context("Failed to create note")?;
            manager.wait_for_indexing().await;
            note_json(note)
        }
        Command::List { state } => {
            let scope = state.map(NoteScope::State).unwrap_or(NoteScope::All);
            let notes = manager.list_notes(scope).await.context("Failed to list notes")?;
            let notes: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
            Ok(json!({ "total": notes.len(), "notes": notes }))
        }
        Command::Show { id } => {
            let note = manager
                .get_note(&id)
                .await
                .with_context(|| format!("Failed to load note {}", id))?;
            note_json(note)
        }
        Command::Edit { id, content } => {
            let update = NoteUpdate {
                content: Some(content),
                ..Default::default()
            };
            let note = manager
                .update_note(&id, update)
                .await
                .with_context(|| format!("Failed to update note {}", id))?;
            manager.wait_for_indexing().await;
            note_json(note)
        }
        Command::Archive { id } => note_json(
            manager
                .archive_note(&id)
                .await
                .with_context(|| format!("Failed to archive note {}", id))?,
        ),
        Command::Activate { id } => note_json(
            manager
                .activate_note(&id)
                .await
                .with_context(|| format!("Failed to activate note {}", id))?,
        ),
        Command::Snooze { id, hours } => {
            let until = Duration::try_hours(hours)
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .with_context(|| format!("Snooze of {} hours is out of range", hours))?;
            note_json(
                manager
                    .snooze_note(&id, until)
                    .await
                    .with_context(|| format!("Failed to snooze note {}", id))?,
            )
        }
        Command::Unsnooze { id } => note_json(
            manager
                .unsnooze_note(&id)
                .await
                .with_context(|| format!("Failed to unsnooze note {}", id))?,
        ),
        Command::Delete { id } => {
            let deleted = manager
                .delete_note(&id)
                .await
                .with_context(|| format!("Failed to delete note {}", id))?;
            Ok(serde_json::to_value(DeleteResponse {
                id: id.to_string(),
                deleted,
            })?)
        }
        Command::Reorder { ids } => {
            let moved = manager.reorder_notes(&ids).await.context("Failed to reorder notes")?;
            Ok(serde_json::to_value(ReorderResponse { moved })?)
        }
        Command::Search {
            query,
            limit,
            context,
        } => {
            let mut config = if context {
                SearchConfig::context()
            } else {
                SearchConfig::default()
            };
            if let Some(limit) = limit {
                config = config.with_limit(limit);
            }
            let outcome = manager.search(&query, &config).await.context("Search failed")?;
            Ok(serde_json::to_value(SearchResponse::from(outcome))?)
        }
        Command::Related { id, limit } => {
            let results = manager
                .related_notes(&id, limit)
                .await
                .with_context(|| format!("Failed to find notes related to {}", id))?;
            let hits: Vec<SearchHit> = results.into_iter().map(SearchHit::from).collect();
            Ok(json!({ "total": hits.len(), "results": hits }))
        }
        Command::Cluster { k } => {
            let clusters = match k {
                Some(k) => manager.cluster_notes(k).await,
                None => manager.cluster_default().await,
            }
            .context("Clustering failed")?;
            clusters_json(clusters)
        }
        Command::Clusters => {
            let clusters = manager.clusters().await.context("Failed to load clusters")?;
            clusters_json(clusters)
        }
        Command::Reindex { force } => {
            let report = manager.reindex(force).await.context("Re-index failed")?;
            Ok(serde_json::to_value(report)?)
        }
        Command::Wake => {
            let woken = manager
                .process_snoozed(Utc::now())
                .await
                .context("Failed to process snoozed notes")?;
            let woken: Vec<NoteResponse> = woken.into_iter().map(NoteResponse::from).collect();
            Ok(json!({ "woken": woken.len(), "notes": woken }))
        }
        Command::Rediscover { mark } => {
            let now = Utc::now();
            let mut rng = StdRng::from_os_rng();
            let candidate = manager
                .rediscovery_candidate(now, &mut rng)
                .await
                .context("Failed to pick a note to rediscover")?;
            let note = match candidate {
                Some(note) if mark => Some(manager.mark_surfaced(&note.id, now).await?),
                other => other,
            };
            Ok(json!({ "note": note.map(NoteResponse::from) }))
        }
        Command::Stats => {
            let stats = manager.stats().await.context("Failed to collect stats")?;
            Ok(serde_json::to_value(stats)?)
        }
    }
}

fn clusters_json(clusters: Vec<stickies_memory::Cluster>) -> Result<Value> {
    let clusters: Vec<ClusterResponse> = clusters.into_iter().map(ClusterResponse::from).collect();
    Ok(json!({ "total": clusters.len(), "clusters": clusters }))
}
