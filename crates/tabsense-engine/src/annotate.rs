//! Batch tab annotation: rules, classification, and history in one pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tabsense_core::Tab;
use tabsense_history::{HistoryEnricher, HistoryStore, TabHistory};
use tabsense_models::ModelManager;
use tabsense_settings::TabsenseSettings;

use crate::context::{ContextFeatures, extract_session_context};
use crate::errors::EngineError;
use crate::fusion::{ClassificationEngine, TabClassification};
use crate::hints::DomainKnowledge;
use crate::rules::{CategoryMatch, categorize};

/// Everything the engine knows about one tab.
///
/// The rule category is always present (rules are total); classification and
/// history are best-effort and degrade to `None` independently.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabAnnotation {
    /// The input tab, unchanged.
    #[serde(flatten)]
    pub tab: Tab,
    /// Deterministic rule category.
    pub rule: CategoryMatch,
    /// Three-taxonomy ML classification, when a ready model produced one.
    pub classification: Option<TabClassification>,
    /// History enrichment, when the store resolved the domain.
    pub history: Option<TabHistory>,
}

/// Top-level orchestrator tying the three annotation sources together.
///
/// One session-context extraction and one history round-trip per batch;
/// per-tab failures in the ML path degrade that tab's `classification` to
/// `None` without touching its siblings.
pub struct TabIntelligence {
    classifier: ClassificationEngine,
    enricher: HistoryEnricher,
}

impl TabIntelligence {
    /// Wire the orchestrator from its collaborators.
    pub fn new(
        manager: Arc<ModelManager>,
        store: Arc<dyn HistoryStore>,
        knowledge: Arc<dyn DomainKnowledge>,
        settings: Arc<TabsenseSettings>,
    ) -> Self {
        Self {
            classifier: ClassificationEngine::new(manager, knowledge, Arc::clone(&settings)),
            enricher: HistoryEnricher::new(store, settings),
        }
    }

    /// Annotate a batch of tabs.
    ///
    /// Output is parallel to the input: same length, same order, one
    /// annotation per tab.
    pub async fn annotate_batch(&self, tabs: &[Tab]) -> Vec<TabAnnotation> {
        let ctx = extract_session_context(tabs);
        info!(
            tabs = tabs.len(),
            domains = ctx.co_occurring_domains.len(),
            "annotating tab batch"
        );

        let enriched = self.enricher.enrich_batch(tabs).await;

        let mut annotations = Vec::with_capacity(tabs.len());
        for enriched_tab in enriched {
            let tab = enriched_tab.tab;
            let rule = categorize(&tab);
            let classification = self.classify_isolated(&tab, &ctx).await;
            annotations.push(TabAnnotation {
                tab,
                rule,
                classification,
                history: enriched_tab.history,
            });
        }
        annotations
    }

    /// Annotate a single tab with the same semantics as a one-element batch.
    pub async fn annotate_tab(&self, tab: &Tab) -> TabAnnotation {
        let mut batch = self.annotate_batch(std::slice::from_ref(tab)).await;
        // annotate_batch output is parallel to its input
        batch.swap_remove(0)
    }

    async fn classify_isolated(
        &self,
        tab: &Tab,
        ctx: &ContextFeatures,
    ) -> Option<TabClassification> {
        match self.classifier.classify(tab, ctx).await {
            Ok(c) => Some(c),
            Err(e @ (EngineError::Disabled | EngineError::NoSignal)) => {
                debug!(tab = tab.id, reason = %e, "skipping classification");
                None
            }
            Err(e) => {
                warn!(tab = tab.id, error = %e, "classification failed, annotating without it");
                None
            }
        }
    }
}
