//! History store contract and sqlite implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Timelike, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, params};
use tracing::debug;

use tabsense_models::status_store::StatusStore;

use crate::errors::{HistoryError, Result};
use crate::stats::{DomainStats, TimePatterns};

/// Read contract over accumulated per-domain visit aggregates.
///
/// Batched lookups are collapsed to a single round-trip per batch so
/// store-access fan-out is bounded by distinct domains, not tab count.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Aggregates for one domain, if it has ever been visited.
    async fn get_domain_stats(&self, domain: &str) -> Result<Option<DomainStats>>;

    /// Aggregates for every domain in `domains` that has history, in one
    /// round-trip. Domains without history are simply absent from the map.
    async fn get_batch_domain_stats(
        &self,
        domains: &[String],
    ) -> Result<HashMap<String, DomainStats>>;
}

/// Sqlite-backed history store.
///
/// Also implements [`StatusStore`] over a `kv` table so the published model
/// descriptor map survives for cross-process pollers.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) the store at `path` and run the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS domain_stats (
                domain      TEXT PRIMARY KEY,
                visit_count INTEGER NOT NULL DEFAULT 0,
                first_visit INTEGER,
                last_visit  INTEGER,
                category    TEXT NOT NULL DEFAULT 'other',
                morning     INTEGER NOT NULL DEFAULT 0,
                afternoon   INTEGER NOT NULL DEFAULT 0,
                evening     INTEGER NOT NULL DEFAULT 0,
                night       INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record one visit to `domain` at epoch ms `at_ms` with the rule
    /// category current at visit time. Upserts the aggregate row.
    pub fn record_visit(&self, domain: &str, at_ms: i64, category: &str) -> Result<()> {
        let hour = Utc
            .timestamp_millis_opt(at_ms)
            .single()
            .map_or(0, |dt| dt.hour());
        let mut patterns = TimePatterns::default();
        patterns.record_hour(hour);

        let conn = self.conn.lock();
        let _ = conn.execute(
            "INSERT INTO domain_stats
                (domain, visit_count, first_visit, last_visit, category,
                 morning, afternoon, evening, night)
             VALUES (?1, 1, ?2, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(domain) DO UPDATE SET
                visit_count = visit_count + 1,
                first_visit = MIN(COALESCE(first_visit, ?2), ?2),
                last_visit  = MAX(COALESCE(last_visit, ?2), ?2),
                category    = ?3,
                morning     = morning + ?4,
                afternoon   = afternoon + ?5,
                evening     = evening + ?6,
                night       = night + ?7",
            params![
                domain,
                at_ms,
                category,
                patterns.morning,
                patterns.afternoon,
                patterns.evening,
                patterns.night
            ],
        )?;
        Ok(())
    }
}

fn row_to_stats(row: &rusqlite::Row<'_>) -> rusqlite::Result<DomainStats> {
    Ok(DomainStats {
        domain: row.get(0)?,
        visit_count: row.get(1)?,
        first_visit: row.get(2)?,
        last_visit: row.get(3)?,
        category: row.get(4)?,
        time_patterns: TimePatterns {
            morning: row.get(5)?,
            afternoon: row.get(6)?,
            evening: row.get(7)?,
            night: row.get(8)?,
        },
    })
}

const STATS_COLUMNS: &str = "domain, visit_count, first_visit, last_visit, category,
     morning, afternoon, evening, night";

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn get_domain_stats(&self, domain: &str) -> Result<Option<DomainStats>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {STATS_COLUMNS} FROM domain_stats WHERE domain = ?1"
        ))?;
        let mut rows = stmt.query_map(params![domain], row_to_stats)?;
        rows.next().transpose().map_err(HistoryError::from)
    }

    async fn get_batch_domain_stats(
        &self,
        domains: &[String],
    ) -> Result<HashMap<String, DomainStats>> {
        if domains.is_empty() {
            return Ok(HashMap::new());
        }

        // One IN-list query: a single round-trip regardless of batch size.
        let placeholders = vec!["?"; domains.len()].join(", ");
        let sql = format!(
            "SELECT {STATS_COLUMNS} FROM domain_stats WHERE domain IN ({placeholders})"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(domains), row_to_stats)?;

        let mut result = HashMap::new();
        for stats in rows {
            let stats = stats?;
            let _ = result.insert(stats.domain.clone(), stats);
        }
        debug!(requested = domains.len(), found = result.len(), "batched domain stats read");
        Ok(result)
    }
}

impl StatusStore for SqliteHistoryStore {
    fn set(&self, key: &str, value: serde_json::Value) -> tabsense_models::Result<()> {
        let serialized =
            serde_json::to_string(&value).map_err(|e| to_model_error(&HistoryError::from(e)))?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, serialized],
        )
        .map_err(|e| to_model_error(&HistoryError::from(e)))?;
        Ok(())
    }

    fn get(&self, key: &str) -> tabsense_models::Result<Option<serde_json::Value>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT value FROM kv WHERE key = ?1")
            .map_err(|e| to_model_error(&HistoryError::from(e)))?;
        let raw: Option<String> = stmt
            .query_map(params![key], |row| row.get(0))
            .map_err(|e| to_model_error(&HistoryError::from(e)))?
            .next()
            .transpose()
            .map_err(|e| to_model_error(&HistoryError::from(e)))?;
        match raw {
            Some(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| to_model_error(&HistoryError::from(e))),
            None => Ok(None),
        }
    }
}

fn to_model_error(e: &HistoryError) -> tabsense_models::ModelError {
    tabsense_models::ModelError::Internal(e.to_string())
}

/// In-memory mock store for tests: seedable stats, scripted failures, and
/// a counter of batched round-trips.
#[derive(Default)]
pub struct MockHistoryStore {
    stats: RwLock<HashMap<String, DomainStats>>,
    fail: AtomicBool,
    batch_calls: AtomicUsize,
}

impl MockHistoryStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed aggregates for one domain.
    pub fn seed(&self, stats: DomainStats) {
        let _ = self.stats.write().insert(stats.domain.clone(), stats);
    }

    /// Make every subsequent read fail.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Number of batched reads issued so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HistoryError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MockHistoryStore {
    async fn get_domain_stats(&self, domain: &str) -> Result<Option<DomainStats>> {
        self.check_failure()?;
        Ok(self.stats.read().get(domain).cloned())
    }

    async fn get_batch_domain_stats(
        &self,
        domains: &[String],
    ) -> Result<HashMap<String, DomainStats>> {
        let _ = self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let stats = self.stats.read();
        Ok(domains
            .iter()
            .filter_map(|d| stats.get(d).map(|s| (d.clone(), s.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_domain_is_none() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        assert_eq!(store.get_domain_stats("a.io").await.unwrap(), None);
    }

    #[tokio::test]
    async fn record_visit_accumulates() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        store.record_visit("a.io", 1_000, "dev").unwrap();
        store.record_visit("a.io", 5_000, "dev").unwrap();
        store.record_visit("a.io", 3_000, "news").unwrap();

        let stats = store.get_domain_stats("a.io").await.unwrap().unwrap();
        assert_eq!(stats.visit_count, 3);
        assert_eq!(stats.first_visit, Some(1_000));
        assert_eq!(stats.last_visit, Some(5_000));
        assert_eq!(stats.category, "news");
    }

    #[tokio::test]
    async fn record_visit_buckets_time_of_day() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        // 2024-01-15 08:00 UTC — morning
        store.record_visit("a.io", 1_705_305_600_000, "dev").unwrap();
        // 2024-01-15 20:00 UTC — evening
        store.record_visit("a.io", 1_705_348_800_000, "dev").unwrap();

        let stats = store.get_domain_stats("a.io").await.unwrap().unwrap();
        assert_eq!(stats.time_patterns.morning, 1);
        assert_eq!(stats.time_patterns.evening, 1);
        assert_eq!(stats.time_patterns.night, 0);
    }

    #[tokio::test]
    async fn batch_read_returns_only_known_domains() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        store.record_visit("a.io", 1_000, "dev").unwrap();
        store.record_visit("b.io", 2_000, "news").unwrap();

        let domains = vec!["a.io".to_string(), "b.io".to_string(), "c.io".to_string()];
        let result = store.get_batch_domain_stats(&domains).await.unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains_key("a.io"));
        assert!(!result.contains_key("c.io"));
    }

    #[tokio::test]
    async fn batch_read_empty_input() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        let result = store.get_batch_domain_stats(&[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn status_store_round_trip() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        store
            .set("models.status", serde_json::json!({"classifier": {"status": "ready"}}))
            .unwrap();
        let v = store.get("models.status").unwrap().unwrap();
        assert_eq!(v["classifier"]["status"], "ready");
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let store = SqliteHistoryStore::open(&path).unwrap();
            store.record_visit("a.io", 1_000, "dev").unwrap();
        }
        let store = SqliteHistoryStore::open(&path).unwrap();
        let stats = store.get_domain_stats("a.io").await.unwrap().unwrap();
        assert_eq!(stats.visit_count, 1);
    }

    #[tokio::test]
    async fn mock_store_counts_batch_calls_and_fails_on_demand() {
        let store = MockHistoryStore::new();
        let _ = store.get_batch_domain_stats(&["a.io".to_string()]).await.unwrap();
        assert_eq!(store.batch_calls(), 1);

        store.set_failing(true);
        assert!(store.get_batch_domain_stats(&["a.io".to_string()]).await.is_err());
        assert_eq!(store.batch_calls(), 2);
    }
}
