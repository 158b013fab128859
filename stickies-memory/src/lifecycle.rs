//! Inbox lifecycle for notes
//!
//! Notes move between four states:
//! - **Inbox**: freshly captured, not yet triaged
//! - **Active**: being worked on
//! - **Snoozed**: hidden until `snoozed_until`, then back to the inbox
//! - **Archived**: done; occasionally resurfaced for rediscovery

use chrono::{DateTime, Duration, Utc};

use crate::note::{Note, NoteState};

/// State transition requested for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Archive,
    Activate,
    Snooze { until: DateTime<Utc> },
    Unsnooze,
}

impl Transition {
    /// State the note ends up in
    pub fn target_state(&self) -> NoteState {
        match self {
            Self::Archive => NoteState::Archived,
            Self::Activate => NoteState::Active,
            Self::Snooze { .. } => NoteState::Snoozed,
            Self::Unsnooze => NoteState::Inbox,
        }
    }

    /// Apply the transition in place. Only snoozing keeps a snooze deadline.
    pub fn apply(&self, note: &mut Note) {
        note.state = self.target_state();
        note.snoozed_until = match self {
            Self::Snooze { until } => Some(*until),
            _ => None,
        };
        note.touch();
    }
}

/// Thresholds for snooze processing and rediscovery
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    /// Archived notes must be untouched at least this long before resurfacing
    pub rediscover_min_age: Duration,
    /// Minimum gap between two resurfacings of the same note
    pub resurface_cooldown: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            rediscover_min_age: Duration::days(3),
            resurface_cooldown: Duration::days(7),
        }
    }
}

impl LifecyclePolicy {
    /// A snoozed note whose deadline has passed
    pub fn is_snooze_due(&self, note: &Note, now: DateTime<Utc>) -> bool {
        note.state == NoteState::Snoozed
            && note.snoozed_until.map(|until| until <= now).unwrap_or(false)
    }

    /// An archived note old enough, and not surfaced recently, to show again
    pub fn is_rediscoverable(&self, note: &Note, now: DateTime<Utc>) -> bool {
        if note.state != NoteState::Archived {
            return false;
        }
        if note.updated_at > now - self.rediscover_min_age {
            return false;
        }
        match note.last_surfaced_at {
            None => true,
            Some(surfaced) => surfaced <= now - self.resurface_cooldown,
        }
    }
}
