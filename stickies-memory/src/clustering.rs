//! K-means clustering of notes by embedding.
//!
//! Lloyd's algorithm over Euclidean distance:
//! 1. Shuffle the items with the caller's random source and seed the k
//!    centroids with the first k vectors
//! 2. Assign every item to its nearest centroid (ties go to the lowest index)
//! 3. Stop when assignments no longer change, otherwise move each centroid to
//!    the mean of its members and repeat, up to `max_iterations`
//!
//! Initialization is random, so cluster identity is not reproducible across
//! runs unless the caller passes a seeded generator. A centroid that loses all
//! of its members keeps its previous position; empty groups are dropped from
//! the output, so fewer than k groups may come back.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{NoteError, Result};
use crate::note::{Note, NoteId};
use crate::similarity::squared_distance_unchecked;

/// Default number of clusters requested per run
pub const DEFAULT_K: usize = 5;

/// Maximum number of Lloyd iterations
pub const MAX_ITERATIONS: usize = 100;

/// Unique identifier for clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub Uuid);

impl ClusterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClusterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named group of topically related notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member notes, in input order
    pub note_ids: Vec<NoteId>,
    /// Place within its clustering run
    #[serde(default)]
    pub ordinal: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    pub fn contains(&self, id: &NoteId) -> bool {
        self.note_ids.contains(id)
    }
}

/// Clustering configuration
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Requested number of clusters (default: 5)
    pub k: usize,
    /// Iteration cap for Lloyd's algorithm (default: 100)
    pub max_iterations: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Result of a k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOutcome {
    /// Non-empty groups of note ids, in centroid index order
    pub groups: Vec<Vec<NoteId>>,
    /// Assignment passes performed
    pub iterations: usize,
    /// False when the iteration cap was hit first
    pub converged: bool,
}

/// Name and optional description for a cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLabel {
    pub name: String,
    pub description: Option<String>,
}

/// Names clusters after a run. Extension point for content-aware naming.
pub trait ClusterNamer: Send + Sync {
    /// `index` is the 0-based position of the cluster in the run's output
    fn label(&self, index: usize, members: &[&Note]) -> ClusterLabel;
}

/// "Cluster 1", "Cluster 2", ...
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderNamer;

impl ClusterNamer for PlaceholderNamer {
    fn label(&self, index: usize, _members: &[&Note]) -> ClusterLabel {
        ClusterLabel {
            name: format!("Cluster {}", index + 1),
            description: None,
        }
    }
}

/// Partition `items` into at most `k` groups.
///
/// With `items.len() <= k` every item becomes its own group without iterating.
pub fn kmeans<R: Rng + ?Sized>(
    items: &[(NoteId, &[f32])],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Result<KMeansOutcome> {
    if items.is_empty() {
        return Ok(KMeansOutcome {
            groups: vec![],
            iterations: 0,
            converged: true,
        });
    }

    if k == 0 {
        return Err(NoteError::InvalidClusterCount(k));
    }

    let dimension = items[0].1.len();
    if let Some((_, v)) = items.iter().find(|(_, v)| v.len() != dimension) {
        return Err(NoteError::invalid_dimension(dimension, v.len()));
    }

    if items.len() <= k {
        return Ok(KMeansOutcome {
            groups: items.iter().map(|(id, _)| vec![*id]).collect(),
            iterations: 0,
            converged: true,
        });
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.shuffle(rng);
    let mut centroids: Vec<Vec<f32>> = order[..k].iter().map(|&i| items[i].1.to_vec()).collect();

    let mut assignments: Option<Vec<usize>> = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let new_assignments: Vec<usize> = items
            .iter()
            .map(|(_, vector)| nearest_centroid(vector, &centroids))
            .collect();

        if assignments.as_ref() == Some(&new_assignments) {
            converged = true;
            break;
        }

        update_centroids(items, &new_assignments, &mut centroids);
        assignments = Some(new_assignments);
    }

    if !converged {
        log::debug!(
            "k-means stopped at the iteration cap ({}) without converging",
            max_iterations
        );
    }

    let mut groups: Vec<Vec<NoteId>> = vec![Vec::new(); k];
    if let Some(assignments) = assignments {
        for ((id, _), &cluster) in items.iter().zip(assignments.iter()) {
            groups[cluster].push(*id);
        }
    }
    groups.retain(|g| !g.is_empty());

    Ok(KMeansOutcome {
        groups,
        iterations,
        converged,
    })
}

/// Index of the closest centroid; the lowest index wins ties
fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance_unchecked(vector, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

/// Move each centroid to the mean of its members. Empty centroids stay put.
fn update_centroids(items: &[(NoteId, &[f32])], assignments: &[usize], centroids: &mut [Vec<f32>]) {
    let dimension = centroids.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0_f32; dimension]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for ((_, vector), &cluster) in items.iter().zip(assignments.iter()) {
        for (sum, value) in sums[cluster].iter_mut().zip(vector.iter()) {
            *sum += value;
        }
        counts[cluster] += 1;
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(counts.iter()) {
        if count == 0 {
            continue;
        }
        *centroid = sum.into_iter().map(|s| s / count as f32).collect();
    }
}

/// Cluster notes that have vectors and turn the groups into named records.
///
/// `k` is clamped to the number of items; an empty input yields no clusters.
pub fn cluster_notes<R: Rng + ?Sized>(
    items: &[(Note, Vec<f32>)],
    config: &ClusterConfig,
    namer: &dyn ClusterNamer,
    rng: &mut R,
) -> Result<Vec<Cluster>> {
    if items.is_empty() {
        return Ok(vec![]);
    }

    let k = config.k.min(items.len());
    let refs: Vec<(NoteId, &[f32])> = items.iter().map(|(n, v)| (n.id, v.as_slice())).collect();
    let outcome = kmeans(&refs, k, config.max_iterations, rng)?;

    log::info!(
        "Clustered {} notes into {} groups ({} iterations, converged: {})",
        items.len(),
        outcome.groups.len(),
        outcome.iterations,
        outcome.converged
    );

    let by_id: HashMap<NoteId, &Note> = items.iter().map(|(n, _)| (n.id, n)).collect();
    Ok(build_clusters(outcome.groups, &by_id, namer, Utc::now()))
}

/// Wrap groups of note ids into cluster records
pub fn build_clusters(
    groups: Vec<Vec<NoteId>>,
    notes: &HashMap<NoteId, &Note>,
    namer: &dyn ClusterNamer,
    now: DateTime<Utc>,
) -> Vec<Cluster> {
    groups
        .into_iter()
        .enumerate()
        .map(|(index, note_ids)| {
            let members: Vec<&Note> = note_ids.iter().filter_map(|id| notes.get(id).copied()).collect();
            let label = namer.label(index, &members);
            Cluster {
                id: ClusterId::new(),
                name: label.name,
                description: label.description,
                note_ids,
                ordinal: index,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}
