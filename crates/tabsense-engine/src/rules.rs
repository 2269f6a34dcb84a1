//! Deterministic domain/pattern/keyword categorization.
//!
//! An ordered static rule table: the first matching category wins, ties
//! resolved by declaration order, not specificity. Per category the match
//! precedence is domain substring, extension suffix, URL regex, then title
//! keyword. Always total — anything unmatched is `other`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use tabsense_core::Tab;

/// One category's matching rule.
struct CategoryRule {
    name: &'static str,
    color: &'static str,
    icon: &'static str,
    /// Substrings matched against the lowercased hostname.
    domains: &'static [&'static str],
    /// Suffixes matched against the URL with query/fragment stripped.
    extensions: &'static [&'static str],
    /// Regexes applied to the URL as-is.
    patterns: Vec<Regex>,
    /// Substrings matched against the lowercased title.
    keywords: &'static [&'static str],
}

/// The category assigned to a tab.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatch {
    /// Category name.
    pub category: String,
    /// UI accent color (hex).
    pub color: String,
    /// UI icon identifier.
    pub icon: String,
}

impl CategoryMatch {
    fn of(rule: &CategoryRule) -> Self {
        Self {
            category: rule.name.to_string(),
            color: rule.color.to_string(),
            icon: rule.icon.to_string(),
        }
    }
}

/// Fallback category for tabs matching no rule.
pub const OTHER_CATEGORY: (&str, &str, &str) = ("other", "#9e9e9e", "globe");

fn rx(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("static category pattern must compile")
}

/// Declaration order is match priority.
static RULES: LazyLock<Vec<CategoryRule>> = LazyLock::new(|| {
    vec![
        CategoryRule {
            name: "development",
            color: "#4caf50",
            icon: "code",
            domains: &[
                "github.com",
                "gitlab.com",
                "stackoverflow.com",
                "stackexchange.com",
                "crates.io",
                "docs.rs",
                "developer.mozilla.org",
                "npmjs.com",
                "localhost",
            ],
            extensions: &[],
            patterns: vec![rx(r"/(pull|merge_requests|issues|commit)/"), rx(r"#diff-")],
            keywords: &["pull request", "merge request", "stack trace", "compiler"],
        },
        CategoryRule {
            name: "communication",
            color: "#2196f3",
            icon: "chat",
            domains: &[
                "mail.google.com",
                "outlook.live.com",
                "outlook.office.com",
                "slack.com",
                "discord.com",
                "teams.microsoft.com",
                "meet.google.com",
                "zoom.us",
                "web.whatsapp.com",
                "web.telegram.org",
            ],
            extensions: &[],
            patterns: vec![],
            keywords: &["inbox", "unread"],
        },
        CategoryRule {
            name: "documents",
            color: "#ff9800",
            icon: "file",
            domains: &["docs.google.com", "notion.so", "dropbox.com"],
            extensions: &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".csv"],
            patterns: vec![],
            keywords: &[],
        },
        CategoryRule {
            name: "entertainment",
            color: "#e91e63",
            icon: "play",
            domains: &[
                "youtube.com",
                "netflix.com",
                "twitch.tv",
                "spotify.com",
                "soundcloud.com",
                "hulu.com",
            ],
            extensions: &[".mp4", ".mp3"],
            patterns: vec![rx(r"[?&]v=[\w-]{11}")],
            keywords: &["watch", "episode", "playlist", "trailer"],
        },
        CategoryRule {
            name: "social",
            color: "#9c27b0",
            icon: "users",
            domains: &[
                "twitter.com",
                "x.com",
                "facebook.com",
                "instagram.com",
                "reddit.com",
                "linkedin.com",
                "mastodon",
                "bsky.app",
            ],
            extensions: &[],
            patterns: vec![rx(r"/r/\w+")],
            keywords: &[],
        },
        CategoryRule {
            name: "shopping",
            color: "#ff5722",
            icon: "cart",
            domains: &["amazon.", "ebay.", "etsy.com", "aliexpress.com", "shopify.com"],
            extensions: &[],
            patterns: vec![rx(r"/(cart|checkout|basket)\b")],
            keywords: &["add to cart", "order", "checkout"],
        },
        CategoryRule {
            name: "news",
            color: "#607d8b",
            icon: "newspaper",
            domains: &[
                "news.ycombinator.com",
                "bbc.",
                "cnn.com",
                "nytimes.com",
                "theguardian.com",
                "reuters.com",
            ],
            extensions: &[],
            patterns: vec![rx(r"/\d{4}/\d{2}/\d{2}/")],
            keywords: &["breaking news", "live updates"],
        },
        CategoryRule {
            name: "finance",
            color: "#009688",
            icon: "bank",
            domains: &["paypal.com", "stripe.com", "coinbase.com", "bank", "wise.com"],
            extensions: &[],
            patterns: vec![],
            keywords: &["invoice", "statement", "balance"],
        },
        CategoryRule {
            name: "search",
            color: "#3f51b5",
            icon: "search",
            domains: &[
                "google.com",
                "bing.com",
                "duckduckgo.com",
                "search.brave.com",
                "startpage.com",
                "ecosia.org",
            ],
            extensions: &[],
            patterns: vec![rx(r"[?&]q=")],
            keywords: &["search results"],
        },
    ]
});

/// Categorize a tab. Total: every tab yields exactly one category.
pub fn categorize(tab: &Tab) -> CategoryMatch {
    let host = tab.domain();
    let url_lower = tab.url.to_lowercase();
    let title_lower = tab.title.to_lowercase();
    let url_no_query = strip_query(&url_lower);

    for rule in RULES.iter() {
        if let Some(host) = host.as_deref()
            && rule.domains.iter().any(|d| host.contains(d))
        {
            return CategoryMatch::of(rule);
        }
        if rule.extensions.iter().any(|e| url_no_query.ends_with(e)) {
            return CategoryMatch::of(rule);
        }
        if rule.patterns.iter().any(|p| p.is_match(&tab.url)) {
            return CategoryMatch::of(rule);
        }
        if !title_lower.is_empty() && rule.keywords.iter().any(|k| title_lower.contains(k)) {
            return CategoryMatch::of(rule);
        }
    }

    let (category, color, icon) = OTHER_CATEGORY;
    CategoryMatch {
        category: category.to_string(),
        color: color.to_string(),
        icon: icon.to_string(),
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
