//! Model descriptors: the tracked lifecycle record for each named model.

use serde::{Deserialize, Serialize};

/// Inference task a pipeline performs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineTask {
    /// Multi-label scoring of a text against candidate labels.
    ZeroShotClassification,
    /// Per-token span tagging.
    TokenTagging,
    /// Dense text embedding.
    Embedding,
}

/// Lifecycle status of one model.
///
/// Legal transitions: `pending → loading → downloading → ready`, or to
/// `error` from any non-terminal state. `ready` and `error` are terminal
/// for a load attempt; a later preload re-enters `loading` from `error`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// Registered, never loaded.
    Pending,
    /// Runtime invocation in flight.
    Loading,
    /// Artifact files being materialized (progress 0–100).
    Downloading,
    /// Pipeline handle available.
    Ready,
    /// Last load attempt failed; see the descriptor's `error` field.
    Error,
}

/// The tracked lifecycle record for one named model.
///
/// Created `pending` at registry init, mutated only by the lifecycle
/// manager, never deleted. Each status transition replaces the whole
/// descriptor entry atomically and is published to the status store so
/// polling UI surfaces observe every step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Registry key (`classifier`, `tagger`, `embedder`).
    pub key: String,
    /// Task this model performs.
    pub task: PipelineTask,
    /// Model name under the local artifact root.
    pub artifact_location: String,
    /// Current lifecycle status.
    pub status: ModelStatus,
    /// Materialization progress 0–100, only meaningful in `downloading`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Human-readable failure message, only set in `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelDescriptor {
    /// A fresh `pending` descriptor.
    pub fn pending(key: &str, task: PipelineTask, artifact_location: &str) -> Self {
        Self {
            key: key.to_string(),
            task,
            artifact_location: artifact_location.to_string(),
            status: ModelStatus::Pending,
            progress: None,
            error: None,
        }
    }
}

/// Progress events emitted by the inference runtime while a pipeline loads.
///
/// A closed set of three variants, each carrying only the fields it needs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// A file is about to be materialized.
    Initiate {
        /// Artifact file name.
        file: String,
    },
    /// Materialization progress for one file.
    Progress {
        /// Artifact file name.
        file: String,
        /// Percent complete, 0–100.
        progress: u8,
    },
    /// One file finished materializing.
    Done {
        /// Artifact file name.
        file: String,
    },
}
