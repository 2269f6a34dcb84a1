//! Taxonomy label sets and score distributions.

use serde::{Deserialize, Serialize};

/// Intent taxonomy labels (why the tab was opened).
pub const INTENT_LABELS: &[&str] = &["informational", "navigational", "transactional"];

/// Status taxonomy labels (what the user still owes the tab).
pub const STATUS_LABELS: &[&str] = &["to-read", "to-do", "reference", "maybe", "done"];

/// Content-type taxonomy labels (what kind of page it is).
pub const CONTENT_TYPE_LABELS: &[&str] = &["content", "communication", "search"];

/// A multi-label score distribution for one taxonomy.
///
/// `labels` and `scores` are parallel; the model emits them sorted by score
/// descending, so index 0 is the model's top prediction. Heuristic boosts
/// adjust `scores` in place without re-sorting — after boosting, label order
/// still reflects the original model ranking, and callers needing the
/// adjusted top label must use [`TaxonomyResult::top_label`], which
/// re-derives it from the current scores.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyResult {
    /// Labels, in the model's original descending-score order.
    pub labels: Vec<String>,
    /// Per-label independent scores in `[0, 1]`, parallel to `labels`.
    /// Multi-label: scores need not sum to 1.
    pub scores: Vec<f32>,
}

impl TaxonomyResult {
    /// Build a result from `(label, score)` pairs, sorting by score
    /// descending so the parallel-array invariant holds.
    pub fn from_pairs(mut pairs: Vec<(String, f32)>) -> Self {
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let (labels, scores) = pairs.into_iter().unzip();
        Self { labels, scores }
    }

    /// Current score of `label`, if present in this taxonomy.
    ///
    /// Values can arrive via `Deserialize` with ragged parallel arrays; a
    /// label without a score behaves like an absent label.
    pub fn score_of(&self, label: &str) -> Option<f32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.scores.get(i).copied())
    }

    /// Additively adjust one label's score, clamped to `[0, 1]`.
    ///
    /// A label absent from this taxonomy is a no-op: heuristic rules target
    /// labels by name and must not error when a taxonomy lacks the label.
    /// A label with no score slot (ragged deserialized value) is a no-op too.
    pub fn boost(&mut self, label: &str, delta: f32) {
        if let Some(i) = self.labels.iter().position(|l| l == label)
            && let Some(score) = self.scores.get_mut(i)
        {
            *score = (*score + delta).clamp(0.0, 1.0);
        }
    }

    /// Top `k` `(label, score)` pairs in the original model order.
    pub fn top_k(&self, k: usize) -> Vec<(&str, f32)> {
        self.labels
            .iter()
            .zip(&self.scores)
            .take(k)
            .map(|(l, &s)| (l.as_str(), s))
            .collect()
    }

    /// The label with the highest *current* score.
    ///
    /// After boosts this can differ from `labels[0]`, which keeps the
    /// original model ranking.
    pub fn top_label(&self) -> Option<(&str, f32)> {
        self.labels
            .iter()
            .zip(&self.scores)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(l, &s)| (l.as_str(), s))
    }
}
