//! Epoch timestamp normalization and age thresholds.
//!
//! Upstream tab-sync sources disagree on the unit of `last_used`: some
//! report epoch seconds, some epoch milliseconds. Everything downstream
//! works in milliseconds, so [`normalize_epoch_ms`] auto-detects the unit
//! by magnitude before any age arithmetic.

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// One week in milliseconds.
pub const WEEK_MS: i64 = 7 * DAY_MS;

/// Tabs younger than this count as "recent" for the session temporal pattern.
pub const RECENT_THRESHOLD_MS: i64 = DAY_MS;

/// Tabs older than this count as "stale" for the session temporal pattern
/// and for the reference-status heuristic boost.
pub const STALE_THRESHOLD_MS: i64 = WEEK_MS;

/// Epoch values below this are treated as seconds and scaled ×1000.
///
/// `1_000_000_000_000` ms is mid-2001; no tab timestamp in milliseconds can
/// plausibly fall below it, and no timestamp in seconds can reach it before
/// the year 33658. Conservative in both directions.
pub const SECONDS_CUTOFF: i64 = 1_000_000_000_000;

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalize an epoch timestamp to milliseconds.
///
/// Values at or below zero are returned as 0 (no timestamp); values below
/// [`SECONDS_CUTOFF`] are assumed to be epoch seconds and scaled.
pub fn normalize_epoch_ms(value: i64) -> i64 {
    if value <= 0 {
        0
    } else if value < SECONDS_CUTOFF {
        value.saturating_mul(1000)
    } else {
        value
    }
}

/// Age in milliseconds of an optional last-used timestamp relative to `now`.
///
/// Missing or zero timestamps yield age 0: they never trigger staleness and
/// never break an "all recent" verdict.
pub fn age_ms(last_used: Option<i64>, now: i64) -> i64 {
    match last_used {
        Some(v) if v > 0 => (now - normalize_epoch_ms(v)).max(0),
        _ => 0,
    }
}
