//! Note types and builders
//!
//! Core types for representing sticky notes.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub Uuid);

impl NoteId {
    /// Create a new random NoteId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Where a note sits in the inbox workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteState {
    #[default]
    Inbox,
    Active,
    Snoozed,
    Archived,
}

impl NoteState {
    pub const ALL: [NoteState; 4] = [Self::Inbox, Self::Active, Self::Snoozed, Self::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Active => "active",
            Self::Snoozed => "snoozed",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for NoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown note state: {}", s))
    }
}

/// Sticky note color tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Pink,
    Blue,
    Green,
}

impl NoteColor {
    pub const ALL: [NoteColor; 4] = [Self::Yellow, Self::Pink, Self::Blue, Self::Green];

    /// Pick a color uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Green => "green",
        }
    }
}

impl std::fmt::Display for NoteColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown note color: {}", s))
    }
}

/// How the note was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSource {
    #[default]
    Text,
    Voice,
}

/// A sticky note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Note text
    pub content: String,
    /// Lifecycle state
    pub state: NoteState,
    /// Color tag
    pub color: NoteColor,
    /// Capture source
    pub source: NoteSource,
    /// Unedited transcript for voice notes
    pub raw_transcript: Option<String>,
    /// Manual sort order (ascending)
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When a snoozed note returns to the inbox
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Last time the note was resurfaced for rediscovery
    pub last_surfaced_at: Option<DateTime<Utc>>,
    /// Optional link to another note
    pub linked_to: Option<NoteId>,
}

impl Note {
    /// Create a new builder for Note
    pub fn builder() -> NoteBuilder {
        NoteBuilder::new()
    }

    /// Stamp the note as modified now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a partial update; returns true when the content changed
    pub fn apply(&mut self, update: NoteUpdate) -> bool {
        let mut content_changed = false;
        if let Some(content) = update.content {
            content_changed = content != self.content;
            self.content = content;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(state) = update.state {
            self.state = state;
        }
        if let Some(snoozed_until) = update.snoozed_until {
            self.snoozed_until = snoozed_until;
        }
        if let Some(last_surfaced_at) = update.last_surfaced_at {
            self.last_surfaced_at = last_surfaced_at;
        }
        if let Some(linked_to) = update.linked_to {
            self.linked_to = linked_to;
        }
        self.touch();
        content_changed
    }
}

/// Input for creating a note
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub content: String,
    pub source: NoteSource,
    pub raw_transcript: Option<String>,
    /// Random color when unset
    pub color: Option<NoteColor>,
}

impl NewNote {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn voice(content: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: NoteSource::Voice,
            raw_transcript: Some(transcript.into()),
            color: None,
        }
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// Partial update; `Some(None)` clears an optional field
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub content: Option<String>,
    pub color: Option<NoteColor>,
    pub state: Option<NoteState>,
    pub snoozed_until: Option<Option<DateTime<Utc>>>,
    pub last_surfaced_at: Option<Option<DateTime<Utc>>>,
    pub linked_to: Option<Option<NoteId>>,
}

/// Builder for Note with fluent API
#[derive(Debug, Default)]
pub struct NoteBuilder {
    id: Option<NoteId>,
    content: Option<String>,
    state: NoteState,
    color: NoteColor,
    source: NoteSource,
    raw_transcript: Option<String>,
    position: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    snoozed_until: Option<DateTime<Utc>>,
    last_surfaced_at: Option<DateTime<Utc>>,
    linked_to: Option<NoteId>,
}

impl NoteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the note ID (auto-generated if not set)
    pub fn id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn state(mut self, state: NoteState) -> Self {
        self.state = state;
        self
    }

    pub fn color(mut self, color: NoteColor) -> Self {
        self.color = color;
        self
    }

    pub fn source(mut self, source: NoteSource) -> Self {
        self.source = source;
        self
    }

    pub fn raw_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.raw_transcript = Some(transcript.into());
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn snoozed_until(mut self, until: DateTime<Utc>) -> Self {
        self.snoozed_until = Some(until);
        self
    }

    pub fn last_surfaced_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_surfaced_at = Some(at);
        self
    }

    pub fn linked_to(mut self, id: NoteId) -> Self {
        self.linked_to = Some(id);
        self
    }

    /// Build the Note
    pub fn build(self) -> Result<Note, NoteBuilderError> {
        let content = self.content.ok_or(NoteBuilderError::MissingContent)?;
        let created_at = self.created_at.unwrap_or_else(Utc::now);

        Ok(Note {
            id: self.id.unwrap_or_default(),
            content,
            state: self.state,
            color: self.color,
            source: self.source,
            raw_transcript: self.raw_transcript,
            position: self.position,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            snoozed_until: self.snoozed_until,
            last_surfaced_at: self.last_surfaced_at,
            linked_to: self.linked_to,
        })
    }
}

/// Errors that can occur when building a Note
#[derive(Debug, thiserror::Error)]
pub enum NoteBuilderError {
    #[error("Missing required field: content")]
    MissingContent,
}
