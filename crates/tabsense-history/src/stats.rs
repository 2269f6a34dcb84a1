//! Per-domain visit aggregates.

use serde::{Deserialize, Serialize};

/// Visit counts bucketed by time of day.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimePatterns {
    /// Visits between 05:00 and 11:59.
    pub morning: u32,
    /// Visits between 12:00 and 16:59.
    pub afternoon: u32,
    /// Visits between 17:00 and 21:59.
    pub evening: u32,
    /// Everything else.
    pub night: u32,
}

impl TimePatterns {
    /// Increment the bucket for the given local hour (0–23).
    pub fn record_hour(&mut self, hour: u32) {
        match hour {
            5..=11 => self.morning += 1,
            12..=16 => self.afternoon += 1,
            17..=21 => self.evening += 1,
            _ => self.night += 1,
        }
    }
}

/// Accumulated visit aggregates for one domain, as stored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainStats {
    /// Lowercased hostname.
    pub domain: String,
    /// Total recorded visits.
    pub visit_count: u32,
    /// Epoch ms of the first recorded visit.
    pub first_visit: Option<i64>,
    /// Epoch ms of the most recent recorded visit.
    pub last_visit: Option<i64>,
    /// Last rule category assigned to the domain.
    pub category: String,
    /// Time-of-day visit distribution.
    pub time_patterns: TimePatterns,
}
