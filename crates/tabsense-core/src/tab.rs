//! The raw tab record supplied by the browser sync layer.

use serde::{Deserialize, Serialize};

use crate::domain::derive_domain;

/// A browser tab as reported by the sync layer (open or historical).
///
/// `last_used` is an epoch timestamp whose unit is not guaranteed by the
/// upstream source — some surfaces report seconds, others milliseconds.
/// Consumers must normalize via [`crate::time::normalize_epoch_ms`] before
/// doing arithmetic on it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Caller-assigned tab id (unique within one batch).
    pub id: i64,
    /// Full URL of the tab.
    pub url: String,
    /// Page title (may be empty for unloaded tabs).
    #[serde(default)]
    pub title: String,
    /// Last-used epoch timestamp, seconds or milliseconds. `None` when the
    /// sync source has no activity record for the tab.
    #[serde(default)]
    pub last_used: Option<i64>,
    /// Whether the browser has marked the tab inactive (discarded/frozen).
    #[serde(default)]
    pub inactive: bool,
}

impl Tab {
    /// Lowercased hostname of the tab URL, when the URL parses and carries
    /// a host. Unparseable URLs yield `None` — callers skip such tabs for
    /// domain-dependent operations instead of failing the batch.
    pub fn domain(&self) -> Option<String> {
        derive_domain(&self.url)
    }
}
