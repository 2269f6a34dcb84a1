//! # tabsense-history
//!
//! Per-domain visit history and confidence-scored tab enrichment.
//!
//! - [`store`]: the [`store::HistoryStore`] read contract, a sqlite
//!   implementation (which doubles as a persistent
//!   [`tabsense_models::StatusStore`]), and a mock for tests
//! - [`stats`]: [`stats::DomainStats`] visit aggregates
//! - [`enrich`]: [`enrich::HistoryEnricher`], one batched store round-trip
//!   per tab batch, degrading gracefully on store failure
//!
//! ## Crate Position
//!
//! Depends on tabsense-core, tabsense-settings, tabsense-models.
//! Depended on by: tabsense-engine.

#![deny(unsafe_code)]

pub mod enrich;
pub mod errors;
pub mod stats;
pub mod store;

pub use enrich::{Confidence, EnrichedTab, HistoryEnricher, TabHistory};
pub use errors::{HistoryError, Result};
pub use stats::{DomainStats, TimePatterns};
pub use store::{HistoryStore, MockHistoryStore, SqliteHistoryStore};
