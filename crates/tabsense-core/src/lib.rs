//! # tabsense-core
//!
//! Foundation types and utilities for the tabsense engine.
//!
//! This crate provides the shared vocabulary that all other tabsense crates
//! depend on:
//!
//! - **Tabs**: [`tab::Tab`], the raw input record (url, title, last-used)
//! - **Taxonomies**: [`taxonomy::TaxonomyResult`] score distributions and the
//!   fixed label sets for intent / status / content type
//! - **Domains**: [`domain::derive_domain`] hostname derivation from tab URLs
//! - **Time**: [`time`] epoch normalization with seconds-vs-milliseconds
//!   auto-detection, and the recency/staleness thresholds
//! - **Text**: [`text`] whitespace normalization and char-budget truncation
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other tabsense crates.

#![deny(unsafe_code)]

pub mod domain;
pub mod tab;
pub mod taxonomy;
pub mod text;
pub mod time;

pub use domain::derive_domain;
pub use tab::Tab;
pub use taxonomy::{CONTENT_TYPE_LABELS, INTENT_LABELS, STATUS_LABELS, TaxonomyResult};
