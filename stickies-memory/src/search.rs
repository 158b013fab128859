//! Note ranking
//!
//! Two modes over the same corpus of `(note, vector)` pairs:
//! - **Semantic**: cosine similarity between the query vector and each stored
//!   vector; notes without a vector are skipped
//! - **Lexical**: distinct query terms found in the note, plus a bonus when
//!   the whole query appears verbatim; used when embeddings are unavailable
//!
//! Both sort by descending score and keep corpus order among equal scores.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::note::{Note, NoteState};
use crate::similarity::cosine_similarity;

/// Notes paired with their stored vectors, in store order
pub type Corpus = Vec<(Note, Option<Vec<f32>>)>;

/// Search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum results to return (default: 10)
    pub limit: usize,
    /// Trimmed queries shorter than this (in chars) return nothing (default: 1)
    pub min_query_len: usize,
    /// Only rank notes in these states; empty means every state
    pub states: Vec<NoteState>,
    /// Archived notes are kept only when they score above this
    pub archived_min_score: Option<f32>,
    /// Added to the lexical score when the whole query matches (default: 0.5)
    pub lexical_phrase_bonus: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            min_query_len: 1,
            states: vec![],
            archived_min_score: None,
            lexical_phrase_bonus: 0.5,
        }
    }
}

impl SearchConfig {
    /// Preset for "related notes while typing": few results, archived notes
    /// only when they are a strong match
    pub fn context() -> Self {
        Self {
            limit: 3,
            min_query_len: 3,
            archived_min_score: Some(0.8),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_states(mut self, states: Vec<NoteState>) -> Self {
        self.states = states;
        self
    }

    /// Whether a query is long enough to search for
    pub fn accepts(&self, query: &str) -> bool {
        let trimmed = query.trim();
        !trimmed.is_empty() && trimmed.chars().count() >= self.min_query_len
    }

    fn includes_state(&self, state: NoteState) -> bool {
        self.states.is_empty() || self.states.contains(&state)
    }

    fn keeps(&self, note: &Note, score: f32) -> bool {
        match (note.state, self.archived_min_score) {
            (NoteState::Archived, Some(min)) => score > min,
            _ => true,
        }
    }
}

/// How a result set was ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Semantic,
    Lexical,
}

/// Why a note matched the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MatchReason {
    #[serde(rename_all = "camelCase")]
    Semantic { similarity: f32 },
    #[serde(rename_all = "camelCase")]
    Lexical {
        matched_terms: usize,
        total_terms: usize,
        phrase_match: bool,
    },
}

/// Search result with score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub note: Note,
    /// Cosine similarity, or term overlap plus phrase bonus
    pub score: f32,
    pub match_reason: MatchReason,
}

impl SearchResult {
    pub fn mode(&self) -> SearchMode {
        match self.match_reason {
            MatchReason::Semantic { .. } => SearchMode::Semantic,
            MatchReason::Lexical { .. } => SearchMode::Lexical,
        }
    }
}

/// Ranked results together with the mode that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub mode: SearchMode,
    pub results: Vec<SearchResult>,
}

impl SearchOutcome {
    pub fn empty(mode: SearchMode) -> Self {
        Self { mode, results: vec![] }
    }
}

/// Stateless ranking over a corpus snapshot
pub struct SearchRanker;

impl SearchRanker {
    /// Rank by cosine similarity to `query_vector`.
    ///
    /// Fails with `InvalidDimension` when a stored vector has a different
    /// length than the query.
    pub fn rank_semantic(
        query_vector: &[f32],
        corpus: &[(Note, Option<Vec<f32>>)],
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>> {
        let mut results = Vec::new();

        for (note, vector) in corpus {
            let Some(vector) = vector else { continue };
            if !config.includes_state(note.state) {
                continue;
            }

            let similarity = cosine_similarity(query_vector, vector)?;
            if !config.keeps(note, similarity) {
                continue;
            }

            results.push(SearchResult {
                note: note.clone(),
                score: similarity,
                match_reason: MatchReason::Semantic { similarity },
            });
        }

        Ok(Self::finish(results, config.limit))
    }

    /// Rank by keyword overlap. Notes matching no term are excluded.
    pub fn rank_lexical(
        query: &str,
        corpus: &[(Note, Option<Vec<f32>>)],
        config: &SearchConfig,
    ) -> Vec<SearchResult> {
        let phrase = query.trim().to_lowercase();
        let terms = distinct_terms(&phrase);
        if terms.is_empty() {
            return vec![];
        }
        // Repeated words count toward the denominator, but match only once
        let total_terms = phrase.split_whitespace().count();

        let mut results = Vec::new();
        for (note, _) in corpus {
            if !config.includes_state(note.state) {
                continue;
            }

            let content = note.content.to_lowercase();
            let matched_terms = terms.iter().filter(|t| content.contains(t.as_str())).count();
            if matched_terms == 0 {
                continue;
            }

            let phrase_match = content.contains(&phrase);
            let mut score = matched_terms as f32 / total_terms as f32;
            if phrase_match {
                score += config.lexical_phrase_bonus;
            }
            if !config.keeps(note, score) {
                continue;
            }

            results.push(SearchResult {
                note: note.clone(),
                score,
                match_reason: MatchReason::Lexical {
                    matched_terms,
                    total_terms,
                    phrase_match,
                },
            });
        }

        Self::finish(results, config.limit)
    }

    /// Stable descending sort, then truncate
    fn finish(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        results
    }
}

/// Whitespace-split terms, first occurrence order, duplicates removed
fn distinct_terms(lowercased: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in lowercased.split_whitespace() {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoteError;

    fn note(content: &str) -> Note {
        Note::builder().content(content).build().unwrap()
    }

    fn corpus(entries: Vec<(&str, Option<Vec<f32>>)>) -> Corpus {
        entries.into_iter().map(|(c, v)| (note(c), v)).collect()
    }

    #[test]
    fn test_search_config_default() {
        let config = SearchConfig::default();
        assert_eq!(config.limit, 10);
        assert_eq!(config.min_query_len, 1);
        assert!(config.states.is_empty());
        assert!(config.archived_min_score.is_none());
        assert_eq!(config.lexical_phrase_bonus, 0.5);
    }

    #[test]
    fn test_accepts() {
        let config = SearchConfig::default();
        assert!(!config.accepts(""));
        assert!(!config.accepts("   \t"));
        assert!(config.accepts("a"));

        let context = SearchConfig::context();
        assert!(!context.accepts(" ab "));
        assert!(context.accepts("abc"));
    }

    #[test]
    fn test_semantic_order_and_skip_missing_vectors() {
        let corpus = corpus(vec![
            ("far", Some(vec![0.0, 1.0])),
            ("none", None),
            ("near", Some(vec![1.0, 0.0])),
            ("mid", Some(vec![0.7, 0.7])),
        ]);

        let results = SearchRanker::rank_semantic(&[1.0, 0.0], &corpus, &SearchConfig::default()).unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.note.content.as_str()).collect();
        assert_eq!(order, vec!["near", "mid", "far"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results.iter().all(|r| r.mode() == SearchMode::Semantic));
    }

    #[test]
    fn test_semantic_ties_keep_corpus_order() {
        let corpus = corpus(vec![
            ("first", Some(vec![1.0, 0.0])),
            ("second", Some(vec![1.0, 0.0])),
            ("third", Some(vec![2.0, 0.0])),
        ]);

        let results = SearchRanker::rank_semantic(&[1.0, 0.0], &corpus, &SearchConfig::default()).unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.note.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_semantic_limit() {
        let corpus: Corpus = (0..20)
            .map(|i| (note(&format!("n{}", i)), Some(vec![1.0, i as f32])))
            .collect();
        let config = SearchConfig::default().with_limit(5);
        let results = SearchRanker::rank_semantic(&[1.0, 0.0], &corpus, &config).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].note.content, "n0");
    }

    #[test]
    fn test_semantic_dimension_mismatch() {
        let corpus = corpus(vec![("a", Some(vec![1.0, 0.0, 0.0]))]);
        let err = SearchRanker::rank_semantic(&[1.0, 0.0], &corpus, &SearchConfig::default()).unwrap_err();
        assert!(matches!(err, NoteError::InvalidDimension { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_lexical_quarterly_report() {
        let corpus = corpus(vec![("Finish quarterly report", None), ("Buy milk and eggs", None)]);
        let results = SearchRanker::rank_lexical("quarterly report", &corpus, &SearchConfig::default());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].note.content, "Finish quarterly report");
        assert!((results[0].score - 1.5).abs() < 1e-6);
        assert_eq!(
            results[0].match_reason,
            MatchReason::Lexical {
                matched_terms: 2,
                total_terms: 2,
                phrase_match: true
            }
        );
    }

    #[test]
    fn test_lexical_partial_and_duplicate_terms() {
        let corpus = corpus(vec![("Report due friday", None), ("quarterly planning", None)]);
        let results = SearchRanker::rank_lexical("Quarterly REPORT report", &corpus, &SearchConfig::default());

        assert_eq!(results.len(), 2);
        assert!((results[0].score - 1.0 / 3.0).abs() < 1e-6);
        assert!((results[1].score - 1.0 / 3.0).abs() < 1e-6);
        // Equal scores: corpus order
        assert_eq!(results[0].note.content, "Report due friday");
        assert_eq!(
            results[0].match_reason,
            MatchReason::Lexical {
                matched_terms: 1,
                total_terms: 3,
                phrase_match: false
            }
        );
    }

    #[test]
    fn test_lexical_repeated_term_counts_in_denominator() {
        let corpus = corpus(vec![("weekly report", None)]);
        let results = SearchRanker::rank_lexical("report report", &corpus, &SearchConfig::default());

        assert_eq!(results.len(), 1);
        assert!((results[0].score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_lexical_matches_substrings() {
        let corpus = corpus(vec![("groceries for the week", None)]);
        let results = SearchRanker::rank_lexical("grocer", &corpus, &SearchConfig::default());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_lexical_blank_query() {
        let corpus = corpus(vec![("anything", None)]);
        assert!(SearchRanker::rank_lexical("   ", &corpus, &SearchConfig::default()).is_empty());
    }

    #[test]
    fn test_state_filter() {
        let mut archived = note("archived report");
        archived.state = NoteState::Archived;
        let corpus: Corpus = vec![(archived, Some(vec![1.0])), (note("inbox report"), Some(vec![1.0]))];

        let config = SearchConfig::default().with_states(vec![NoteState::Inbox]);
        let results = SearchRanker::rank_semantic(&[1.0], &corpus, &config).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].note.content, "inbox report");

        let lexical = SearchRanker::rank_lexical("report", &corpus, &config);
        assert_eq!(lexical.len(), 1);
    }

    #[test]
    fn test_archived_threshold() {
        let mut strong = note("strong");
        strong.state = NoteState::Archived;
        let mut weak = note("weak");
        weak.state = NoteState::Archived;
        let corpus: Corpus = vec![
            (strong, Some(vec![1.0, 0.1])),
            (weak, Some(vec![0.5, 0.5])),
            (note("active"), Some(vec![0.0, 1.0])),
        ];

        let results = SearchRanker::rank_semantic(&[1.0, 0.0], &corpus, &SearchConfig::context()).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.note.content.as_str()).collect();
        assert_eq!(names, vec!["strong", "active"]);
    }

    #[test]
    fn test_match_reason_json() {
        let reason = MatchReason::Lexical {
            matched_terms: 1,
            total_terms: 2,
            phrase_match: false,
        };
        let value = serde_json::to_value(&reason).unwrap();
        assert_eq!(value["type"], "lexical");
        assert_eq!(value["matchedTerms"], 1);
        assert_eq!(value["phraseMatch"], false);
    }
}
