//! Session-level feature extraction over a batch of tabs.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use tabsense_core::{Tab, time};

/// Temporal shape of the session.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemporalPattern {
    /// Every tab's age is under 24 hours. False for an empty batch.
    pub all_recent: bool,
    /// At least one tab's age exceeds 7 days.
    pub has_stale_tabs: bool,
    /// Newest minus oldest normalized timestamp, in ms.
    pub age_spread_ms: i64,
}

/// Derived per-batch session statistics. Recomputed per call, never
/// persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextFeatures {
    /// Total tabs in the batch, including ones without a resolvable domain.
    pub total_tabs: usize,
    /// Distinct domains present in the batch.
    pub co_occurring_domains: HashSet<String>,
    /// Tab count per domain. Tabs without a resolvable domain are excluded
    /// here and from `co_occurring_domains`, but counted in `total_tabs`.
    pub domain_clusters: HashMap<String, u32>,
    /// `now − oldest normalized last_used`, 0 when no tab has a timestamp.
    pub session_age_ms: i64,
    /// Recency/staleness shape of the batch.
    pub temporal: TemporalPattern,
}

/// Extract session features for a batch using the current wall clock.
pub fn extract_session_context(tabs: &[Tab]) -> ContextFeatures {
    extract_session_context_at(tabs, time::now_ms())
}

/// Extract session features relative to an explicit `now` (epoch ms).
pub fn extract_session_context_at(tabs: &[Tab], now: i64) -> ContextFeatures {
    if tabs.is_empty() {
        return ContextFeatures::default();
    }

    let mut domain_clusters: HashMap<String, u32> = HashMap::new();
    for tab in tabs {
        if let Some(domain) = tab.domain() {
            *domain_clusters.entry(domain).or_insert(0) += 1;
        }
    }
    let co_occurring_domains: HashSet<String> = domain_clusters.keys().cloned().collect();

    // Normalized timestamps, for tabs that have one.
    let timestamps: Vec<i64> = tabs
        .iter()
        .filter_map(|t| t.last_used)
        .filter(|&v| v > 0)
        .map(time::normalize_epoch_ms)
        .collect();

    let session_age_ms = timestamps
        .iter()
        .min()
        .map_or(0, |&oldest| (now - oldest).max(0));
    let age_spread_ms = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(&oldest), Some(&newest)) => newest - oldest,
        _ => 0,
    };

    // Missing timestamps count as age 0: recent, never stale.
    let all_recent = tabs
        .iter()
        .all(|t| time::age_ms(t.last_used, now) < time::RECENT_THRESHOLD_MS);
    let has_stale_tabs = tabs
        .iter()
        .any(|t| time::age_ms(t.last_used, now) > time::STALE_THRESHOLD_MS);

    ContextFeatures {
        total_tabs: tabs.len(),
        co_occurring_domains,
        domain_clusters,
        session_age_ms,
        temporal: TemporalPattern {
            all_recent,
            has_stale_tabs,
            age_spread_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tab(id: i64, url: &str, last_used: Option<i64>) -> Tab {
        Tab {
            id,
            url: url.into(),
            title: String::new(),
            last_used,
            inactive: false,
        }
    }

    #[test]
    fn empty_batch_is_zero_valued() {
        let ctx = extract_session_context(&[]);
        assert_eq!(ctx.total_tabs, 0);
        assert!(ctx.co_occurring_domains.is_empty());
        assert!(ctx.domain_clusters.is_empty());
        assert_eq!(ctx.session_age_ms, 0);
        assert!(!ctx.temporal.all_recent);
        assert!(!ctx.temporal.has_stale_tabs);
    }

    #[test]
    fn clusters_count_per_domain() {
        let now = time::now_ms();
        let tabs = vec![
            tab(1, "https://a.io/1", Some(now)),
            tab(2, "https://a.io/2", Some(now)),
            tab(3, "https://b.io/1", Some(now)),
            tab(4, "chrome://settings", Some(now)),
        ];
        let ctx = extract_session_context_at(&tabs, now);
        assert_eq!(ctx.total_tabs, 4);
        assert_eq!(ctx.domain_clusters["a.io"], 2);
        assert_eq!(ctx.domain_clusters["b.io"], 1);
        assert_eq!(ctx.co_occurring_domains.len(), 2);
    }

    #[test]
    fn session_age_is_oldest_tab() {
        let now = time::now_ms();
        let tabs = vec![
            tab(1, "https://a.io", Some(now - 1_000)),
            tab(2, "https://b.io", Some(now - 10_000)),
            tab(3, "https://c.io", Some(now - 5_000)),
        ];
        let ctx = extract_session_context_at(&tabs, now);
        assert!((10_000..11_000).contains(&ctx.session_age_ms));
        assert_eq!(ctx.temporal.age_spread_ms, 9_000);
    }

    #[test]
    fn seconds_timestamps_do_not_misscale() {
        let now = time::now_ms();
        let hour_ago_secs = now / 1000 - 3600;
        let ctx = extract_session_context_at(&[tab(1, "https://a.io", Some(hour_ago_secs))], now);
        assert!(
            (3_600_000..3_700_000).contains(&ctx.session_age_ms),
            "got {} ms",
            ctx.session_age_ms
        );
    }

    #[test]
    fn stale_tab_flips_temporal_flags() {
        let now = time::now_ms();
        let eight_days = 8 * 24 * 3600 * 1000;
        let tabs = vec![
            tab(1, "https://a.io", Some(now)),
            tab(2, "https://b.io", Some(now - eight_days)),
        ];
        let ctx = extract_session_context_at(&tabs, now);
        assert!(!ctx.temporal.all_recent);
        assert!(ctx.temporal.has_stale_tabs);
        assert!(ctx.temporal.age_spread_ms > 7 * 24 * 3600 * 1000);
    }

    #[test]
    fn missing_timestamps_are_recent_not_stale() {
        let now = time::now_ms();
        let tabs = vec![tab(1, "https://a.io", None), tab(2, "https://b.io", Some(now))];
        let ctx = extract_session_context_at(&tabs, now);
        assert!(ctx.temporal.all_recent);
        assert!(!ctx.temporal.has_stale_tabs);
        assert_eq!(ctx.session_age_ms, 0);
    }

    #[test]
    fn batch_without_any_timestamp_has_zero_age() {
        let now = time::now_ms();
        let ctx = extract_session_context_at(&[tab(1, "https://a.io", None)], now);
        assert_eq!(ctx.session_age_ms, 0);
        assert_eq!(ctx.temporal.age_spread_ms, 0);
    }

    proptest! {
        /// Cluster counts always sum to the number of tabs with a
        /// resolvable domain, and the co-occurrence set mirrors the
        /// cluster keys.
        #[test]
        fn cluster_invariants(hosts in proptest::collection::vec("[a-d]", 0..20)) {
            let now = time::now_ms();
            let tabs: Vec<Tab> = hosts
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    // every fifth tab gets an unresolvable url
                    let url = if i % 5 == 4 {
                        "about:blank".to_string()
                    } else {
                        format!("https://{h}.example.com/{i}")
                    };
                    tab(i as i64, &url, Some(now))
                })
                .collect();

            let ctx = extract_session_context_at(&tabs, now);
            let resolvable = tabs.iter().filter(|t| t.domain().is_some()).count() as u32;
            let cluster_sum: u32 = ctx.domain_clusters.values().sum();
            prop_assert_eq!(cluster_sum, resolvable);
            prop_assert_eq!(ctx.domain_clusters.len(), ctx.co_occurring_domains.len());
            prop_assert_eq!(ctx.total_tabs, tabs.len());
        }
    }
}
