//! Classification fusion: three-taxonomy inference plus heuristic
//! re-ranking.
//!
//! Stage 1 builds a bounded text signal from the tab; stage 2 issues three
//! independent zero-shot calls (concurrently — they share no resource);
//! stage 3 applies heuristic boosts in a fixed order. Boosts adjust scores
//! in place without renormalizing or re-sorting, so label order keeps the
//! model's original ranking.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabsense_core::{
    CONTENT_TYPE_LABELS, INTENT_LABELS, STATUS_LABELS, Tab, TaxonomyResult, domain, text, time,
};
use tabsense_models::{ModelError, ModelManager};
use tabsense_settings::TabsenseSettings;

use crate::context::ContextFeatures;
use crate::errors::{EngineError, Result};
use crate::hints::{DomainKnowledge, Taxonomy};

/// Registry key of the pipeline classification runs on.
const CLASSIFIER_KEY: &str = "classifier";

const STALE_REFERENCE_BOOST: f32 = 0.3;
const COMMUNICATION_BOOST: f32 = 0.3;
const SEARCH_CONTENT_BOOST: f32 = 0.3;
const SEARCH_INTENT_BOOST: f32 = 0.2;
const INACTIVE_MAYBE_BOOST: f32 = 0.2;
const INACTIVE_TODO_CUT: f32 = -0.2;

/// Mail/chat/meeting providers, matched exactly against the tab's domain.
const COMMUNICATION_DOMAINS: &[&str] = &[
    "mail.google.com",
    "outlook.live.com",
    "outlook.office.com",
    "slack.com",
    "app.slack.com",
    "discord.com",
    "teams.microsoft.com",
    "meet.google.com",
    "zoom.us",
    "web.whatsapp.com",
    "web.telegram.org",
    "messenger.com",
];

/// Search engines, matched exactly or with a `www.` prefix.
const SEARCH_ENGINE_DOMAINS: &[&str] = &[
    "google.com",
    "bing.com",
    "duckduckgo.com",
    "search.brave.com",
    "startpage.com",
    "ecosia.org",
    "kagi.com",
    "search.yahoo.com",
];

/// The three taxonomy distributions for one tab.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabClassification {
    /// Why the tab was opened.
    pub intent: TaxonomyResult,
    /// What the user still owes the tab.
    pub status: TaxonomyResult,
    /// What kind of page it is.
    pub content_type: TaxonomyResult,
}

/// Build the bounded text signal for a tab: title, domain, and the URL path
/// with separators flattened, whitespace-normalized and truncated to
/// `max_chars`.
pub fn build_signal(tab: &Tab, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let title = tab.title.trim();
    if !title.is_empty() {
        parts.push(title.to_string());
    }
    if let Some(d) = tab.domain() {
        parts.push(d);
    }
    if let Some(path) = domain::url_path(&tab.url) {
        let flattened: String = path
            .chars()
            .map(|c| if matches!(c, '/' | '-' | '_' | '+' | '.') { ' ' } else { c })
            .collect();
        parts.push(flattened);
    }
    let joined = text::normalize_whitespace(&parts.join(" "));
    text::truncate_chars(&joined, max_chars).to_string()
}

/// Orchestrates three-taxonomy classification through the model manager.
pub struct ClassificationEngine {
    manager: Arc<ModelManager>,
    knowledge: Arc<dyn DomainKnowledge>,
    settings: Arc<TabsenseSettings>,
}

impl ClassificationEngine {
    /// Create an engine over a model manager and a domain-knowledge
    /// collaborator.
    pub fn new(
        manager: Arc<ModelManager>,
        knowledge: Arc<dyn DomainKnowledge>,
        settings: Arc<TabsenseSettings>,
    ) -> Self {
        Self {
            manager,
            knowledge,
            settings,
        }
    }

    /// Classify one tab against all three taxonomies.
    ///
    /// Fails with [`EngineError::ModelUnavailable`] when the classifier
    /// pipeline is not ready — no default distribution is fabricated — and
    /// with [`EngineError::NoSignal`] for degenerate inputs.
    pub async fn classify(
        &self,
        tab: &Tab,
        ctx: &ContextFeatures,
    ) -> Result<TabClassification> {
        if !self.settings.enabled || !self.settings.features.classify_tabs {
            return Err(EngineError::Disabled);
        }

        let signal = build_signal(tab, self.settings.classification.max_signal_chars);
        if signal.chars().count() < self.settings.classification.min_signal_chars {
            return Err(EngineError::NoSignal);
        }

        let pipeline = self.manager.pipeline(CLASSIFIER_KEY).map_err(|e| match e {
            ModelError::NotReady(key) => EngineError::ModelUnavailable(key),
            other => EngineError::Model(other),
        })?;

        debug!(
            tab = tab.id,
            session_tabs = ctx.total_tabs,
            signal_chars = signal.chars().count(),
            "classifying tab"
        );

        // Independent taxonomies, no shared resource: run concurrently.
        let (intent, status, content_type) = tokio::join!(
            pipeline.classify(&signal, INTENT_LABELS),
            pipeline.classify(&signal, STATUS_LABELS),
            pipeline.classify(&signal, CONTENT_TYPE_LABELS),
        );

        let mut classification = TabClassification {
            intent: intent?,
            status: status?,
            content_type: content_type?,
        };
        apply_boosts(
            tab,
            time::now_ms(),
            &mut classification,
            self.knowledge.as_ref(),
        );
        Ok(classification)
    }
}

/// Stage 3: heuristic re-ranking, in this fixed order. Each matching rule
/// additively adjusts one label's score (clamped to `[0, 1]`) in place.
pub(crate) fn apply_boosts(
    tab: &Tab,
    now: i64,
    c: &mut TabClassification,
    knowledge: &dyn DomainKnowledge,
) {
    let tab_domain = tab.domain();

    if time::age_ms(tab.last_used, now) > time::STALE_THRESHOLD_MS {
        c.status.boost("reference", STALE_REFERENCE_BOOST);
    }

    if let Some(d) = tab_domain.as_deref() {
        if COMMUNICATION_DOMAINS.contains(&d) {
            c.content_type.boost("communication", COMMUNICATION_BOOST);
        }
        if is_search_engine(d) {
            c.content_type.boost("search", SEARCH_CONTENT_BOOST);
            c.intent.boost("informational", SEARCH_INTENT_BOOST);
        }
    }

    if tab.inactive {
        c.status.boost("maybe", INACTIVE_MAYBE_BOOST);
        c.status.boost("to-do", INACTIVE_TODO_CUT);
    }

    if let Some(hints) = tab_domain.as_deref().and_then(|d| knowledge.get_hints(d)) {
        for (taxonomy, deltas) in hints {
            let target = match taxonomy {
                Taxonomy::Intent => &mut c.intent,
                Taxonomy::Status => &mut c.status,
                Taxonomy::ContentType => &mut c.content_type,
            };
            for (label, delta) in deltas {
                target.boost(&label, delta);
            }
        }
    }
}

fn is_search_engine(d: &str) -> bool {
    SEARCH_ENGINE_DOMAINS
        .iter()
        .any(|s| d == *s || d.strip_prefix("www.") == Some(s))
}
