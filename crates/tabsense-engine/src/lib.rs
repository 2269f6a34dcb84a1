//! # tabsense-engine
//!
//! Tab annotation pipeline: deterministic rules, three-taxonomy ML
//! classification with heuristic re-ranking, and session context.
//!
//! - [`rules`]: ordered static category table, total over every tab
//! - [`context`]: per-batch session features ([`context::ContextFeatures`])
//! - [`fusion`]: signal building, concurrent taxonomy inference, and the
//!   fixed-order boost pass ([`fusion::ClassificationEngine`])
//! - [`hints`]: the optional [`hints::DomainKnowledge`] collaborator
//! - [`annotate`]: [`annotate::TabIntelligence`], the batch orchestrator
//!   merging all three sources with independent per-source degradation
//!
//! ## Crate Position
//!
//! Top-level crate. Depends on tabsense-core, tabsense-settings,
//! tabsense-models, and tabsense-history.

#![deny(unsafe_code)]

pub mod annotate;
pub mod context;
pub mod errors;
pub mod fusion;
pub mod hints;
pub mod rules;

pub use annotate::{TabAnnotation, TabIntelligence};
pub use context::{ContextFeatures, TemporalPattern, extract_session_context};
pub use errors::{EngineError, Result};
pub use fusion::{ClassificationEngine, TabClassification, build_signal};
pub use hints::{DomainHints, DomainKnowledge, NoHints, StaticDomainKnowledge, Taxonomy};
pub use rules::{CategoryMatch, categorize};
