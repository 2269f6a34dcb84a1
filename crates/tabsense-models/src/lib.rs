//! # tabsense-models
//!
//! Model lifecycle management and inference runtime contracts.
//!
//! - [`descriptor`]: [`descriptor::ModelDescriptor`] lifecycle records and
//!   the closed [`descriptor::ProgressEvent`] set
//! - [`manager`]: [`manager::ModelManager`], the exclusive writer of the
//!   descriptor registry with sequential batch preloads and per-model
//!   failure isolation
//! - [`runtime`]: the [`runtime::InferenceRuntime`] /
//!   [`runtime::TextPipeline`] contracts plus deterministic mocks
//! - [`ort_runtime`] (feature `ort`): local-artifact-only ONNX runtime
//! - [`status_store`]: shared key-value space for cross-surface status
//!   polling
//!
//! ## Crate Position
//!
//! Depends on tabsense-core and tabsense-settings.
//! Depended on by: tabsense-engine, tabsense-history (status persistence).

#![deny(unsafe_code)]

pub mod descriptor;
pub mod errors;
pub mod manager;
#[cfg(feature = "ort")]
pub mod ort_runtime;
pub mod runtime;
pub mod status_store;

pub use descriptor::{ModelDescriptor, ModelStatus, PipelineTask, ProgressEvent};
pub use errors::{ModelError, Result};
pub use manager::{
    LIGHTWEIGHT_KEYS, MODEL_KEYS, ModelManager, ProgressListener, RuntimeFactory,
};
pub use runtime::{
    InferenceRuntime, MockPipeline, MockRuntime, ProgressCallback, TextPipeline,
};
pub use status_store::{MODELS_STATUS_KEY, MemoryStatusStore, StatusStore};
