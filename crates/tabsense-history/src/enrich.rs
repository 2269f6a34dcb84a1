//! History-derived tab enrichment with confidence scoring.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tabsense_core::{Tab, time};
use tabsense_settings::TabsenseSettings;

use crate::stats::{DomainStats, TimePatterns};
use crate::store::HistoryStore;

/// Coarse trust bucket derived from visit count, used to gate how much the
/// UI leans on an enrichment value.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// No visit history at all.
    None,
    /// 1–4 visits.
    Low,
    /// 5–19 visits.
    Medium,
    /// 20 or more visits.
    High,
}

impl Confidence {
    /// Tier for a visit count.
    pub fn for_visits(visit_count: u32) -> Self {
        match visit_count {
            0 => Self::None,
            1..=4 => Self::Low,
            5..=19 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// Minimum visits before a domain's tabs are heuristically safe to close.
const SAFE_TO_CLOSE_MIN_VISITS: u32 = 3;

/// History annotation attached to one tab.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabHistory {
    /// Domain the enrichment was looked up by.
    pub domain: String,
    /// True when the store had no record of the domain.
    pub is_new: bool,
    /// Total recorded visits.
    pub visit_count: u32,
    /// Epoch ms of the first recorded visit.
    pub first_visit: Option<i64>,
    /// Epoch ms of the most recent recorded visit.
    pub last_visit: Option<i64>,
    /// Last rule category recorded for the domain.
    pub category: String,
    /// Whether closing the tab is unlikely to lose unique content.
    pub safe_to_close: bool,
    /// `now − last_visit` in ms; `None` without a last visit.
    pub time_since_last_visit: Option<i64>,
    /// Time-of-day visit distribution.
    pub time_patterns: TimePatterns,
    /// Trust tier for this enrichment.
    pub confidence: Confidence,
}

/// A tab plus its optional history annotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTab {
    /// The input tab, unchanged.
    #[serde(flatten)]
    pub tab: Tab,
    /// History enrichment; `None` when disabled, unresolvable, or degraded.
    pub history: Option<TabHistory>,
}

/// Batched history enrichment over an external [`HistoryStore`].
pub struct HistoryEnricher {
    store: Arc<dyn HistoryStore>,
    settings: Arc<TabsenseSettings>,
}

impl HistoryEnricher {
    /// Create an enricher over `store` gated by `settings`.
    pub fn new(store: Arc<dyn HistoryStore>, settings: Arc<TabsenseSettings>) -> Self {
        Self { store, settings }
    }

    /// Enrich a batch of tabs with exactly one store round-trip.
    ///
    /// Disabled by configuration ⇒ every tab gets `history: None` and the
    /// store is never touched. A store failure degrades the whole batch to
    /// `history: None` rather than raising.
    pub async fn enrich_batch(&self, tabs: &[Tab]) -> Vec<EnrichedTab> {
        if !self.settings.enabled || !self.settings.features.enrich_tab_cards {
            debug!("history enrichment disabled, short-circuiting");
            return tabs
                .iter()
                .map(|t| EnrichedTab {
                    tab: t.clone(),
                    history: None,
                })
                .collect();
        }

        let domains: Vec<String> = tabs
            .iter()
            .filter_map(Tab::domain)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let stats = match self.store.get_batch_domain_stats(&domains).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "history store read failed, degrading batch to no history");
                return tabs
                    .iter()
                    .map(|t| EnrichedTab {
                        tab: t.clone(),
                        history: None,
                    })
                    .collect();
            }
        };

        let now = time::now_ms();
        tabs.iter()
            .map(|tab| {
                let history = tab
                    .domain()
                    .map(|domain| match stats.get(&domain) {
                        Some(s) => known_domain(s, now),
                        None => new_domain(&domain),
                    });
                EnrichedTab {
                    tab: tab.clone(),
                    history,
                }
            })
            .collect()
    }

    /// Single-tab convenience with the same semantics as [`enrich_batch`].
    ///
    /// [`enrich_batch`]: HistoryEnricher::enrich_batch
    pub async fn enrich_tab(&self, tab: &Tab) -> EnrichedTab {
        self.enrich_batch(std::slice::from_ref(tab))
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| EnrichedTab {
                tab: tab.clone(),
                history: None,
            })
    }
}

fn known_domain(stats: &DomainStats, now: i64) -> TabHistory {
    TabHistory {
        domain: stats.domain.clone(),
        is_new: false,
        visit_count: stats.visit_count,
        first_visit: stats.first_visit,
        last_visit: stats.last_visit,
        category: stats.category.clone(),
        safe_to_close: stats.visit_count >= SAFE_TO_CLOSE_MIN_VISITS,
        time_since_last_visit: stats.last_visit.map(|lv| (now - lv).max(0)),
        time_patterns: stats.time_patterns,
        confidence: Confidence::for_visits(stats.visit_count),
    }
}

/// Synthesized enrichment for a domain the store has never seen.
fn new_domain(domain: &str) -> TabHistory {
    TabHistory {
        domain: domain.to_string(),
        is_new: true,
        visit_count: 0,
        first_visit: None,
        last_visit: None,
        category: "other".to_string(),
        safe_to_close: false,
        time_since_last_visit: None,
        time_patterns: TimePatterns::default(),
        confidence: Confidence::None,
    }
}
