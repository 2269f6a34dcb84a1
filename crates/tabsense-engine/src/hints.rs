//! Optional per-domain classification hints from external domain knowledge.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The three independent taxonomies.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Taxonomy {
    /// Why the tab was opened.
    Intent,
    /// What the user still owes the tab.
    Status,
    /// What kind of page it is.
    ContentType,
}

/// Score deltas per taxonomy and label for one domain.
///
/// Applied with the same additive clamp rule as the built-in heuristics;
/// labels absent from a taxonomy are no-ops.
pub type DomainHints = HashMap<Taxonomy, HashMap<String, f32>>;

/// External domain knowledge collaborator. Optional; defaults to no hints.
pub trait DomainKnowledge: Send + Sync {
    /// Hints for `domain`, if this collaborator knows anything about it.
    fn get_hints(&self, domain: &str) -> Option<DomainHints>;
}

/// The default collaborator: knows nothing.
#[derive(Default)]
pub struct NoHints;

impl DomainKnowledge for NoHints {
    fn get_hints(&self, _domain: &str) -> Option<DomainHints> {
        None
    }
}

/// Static table of hints, keyed by exact domain.
#[derive(Default)]
pub struct StaticDomainKnowledge {
    hints: HashMap<String, DomainHints>,
}

impl StaticDomainKnowledge {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hint delta for `domain`.
    #[must_use]
    pub fn with_hint(mut self, domain: &str, taxonomy: Taxonomy, label: &str, delta: f32) -> Self {
        let _ = self
            .hints
            .entry(domain.to_string())
            .or_default()
            .entry(taxonomy)
            .or_default()
            .insert(label.to_string(), delta);
        self
    }
}

impl DomainKnowledge for StaticDomainKnowledge {
    fn get_hints(&self, domain: &str) -> Option<DomainHints> {
        self.hints.get(domain).cloned()
    }
}
