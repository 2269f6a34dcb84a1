//! Inference runtime contract and mock implementation.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use tabsense_core::TaxonomyResult;

use crate::descriptor::{PipelineTask, ProgressEvent};
use crate::errors::{ModelError, Result};

/// Callback invoked with materialization progress while a pipeline loads.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// A loaded inference pipeline.
///
/// Every bundled model is consumed through candidate-label scoring: the
/// zero-shot classifier scores hypothesis entailment, the embedder scores
/// label similarity, the tagger scores label presence over tagged spans.
/// Scores are independent per label (multi-label); they need not sum to 1.
#[async_trait]
pub trait TextPipeline: Send + Sync {
    /// The task this pipeline was loaded for.
    fn task(&self) -> PipelineTask;

    /// Score `text` against `labels`, returning a descending-score
    /// distribution over exactly those labels.
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<TaxonomyResult>;
}

impl std::fmt::Debug for dyn TextPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPipeline")
            .field("task", &self.task())
            .finish_non_exhaustive()
    }
}

/// The external inference runtime, consumed through a narrow contract.
///
/// Implementations must resolve model artifacts from a local-only root and
/// reject anything that would require a network fetch — the engine has to
/// work fully offline.
#[async_trait]
pub trait InferenceRuntime: Send + Sync {
    /// Load a pipeline for `task` backed by the named local model.
    ///
    /// `on_progress` receives [`ProgressEvent`]s as artifact files are
    /// materialized. Runs to completion or failure; there is no
    /// cancellation primitive.
    async fn load_pipeline(
        &self,
        task: PipelineTask,
        model: &str,
        on_progress: ProgressCallback,
    ) -> Result<Arc<dyn TextPipeline>>;
}

/// Mock runtime for tests: deterministic pipelines, scripted failures,
/// recorded load order.
#[derive(Default)]
pub struct MockRuntime {
    failing_models: Mutex<Vec<String>>,
    load_order: Mutex<Vec<String>>,
}

impl MockRuntime {
    /// Create a mock runtime where every load succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future loads of `model` fail with a runtime error.
    pub fn fail_model(&self, model: &str) {
        self.failing_models.lock().push(model.to_string());
    }

    /// Models passed to `load_pipeline`, in call order.
    pub fn load_order(&self) -> Vec<String> {
        self.load_order.lock().clone()
    }
}

#[async_trait]
impl InferenceRuntime for MockRuntime {
    async fn load_pipeline(
        &self,
        task: PipelineTask,
        model: &str,
        on_progress: ProgressCallback,
    ) -> Result<Arc<dyn TextPipeline>> {
        self.load_order.lock().push(model.to_string());

        let file = format!("{model}/model.onnx");
        on_progress(ProgressEvent::Initiate { file: file.clone() });
        on_progress(ProgressEvent::Progress {
            file: file.clone(),
            progress: 50,
        });

        if self.failing_models.lock().iter().any(|m| m == model) {
            return Err(ModelError::Runtime(format!(
                "scripted failure loading {model}"
            )));
        }

        on_progress(ProgressEvent::Done { file });
        Ok(Arc::new(MockPipeline::new(task, model)))
    }
}

/// Deterministic scoring pipeline: hashes `(model, text, label)` and maps
/// the digest to a stable score in `[0, 1]`, so tests get repeatable
/// distributions without real inference.
///
/// Carries its state behind the same async mutex discipline as the
/// production pipeline — held for the whole call, with a suspension point
/// while held — so tests exercise concurrent callers queuing on one handle.
pub struct MockPipeline {
    task: PipelineTask,
    model: String,
    calls: Arc<tokio::sync::Mutex<u64>>,
}

impl MockPipeline {
    /// Create a standalone mock pipeline.
    pub fn new(task: PipelineTask, model: &str) -> Self {
        Self {
            task,
            model: model.to_string(),
            calls: Arc::new(tokio::sync::Mutex::new(0)),
        }
    }

    /// Number of `classify` calls completed against this pipeline.
    pub fn completed_calls(&self) -> u64 {
        self.calls.try_lock().map_or(0, |calls| *calls)
    }

    fn score(&self, text: &str, label: &str) -> f32 {
        let mut hasher = Sha256::new();
        hasher.update(self.model.as_bytes());
        hasher.update(text.as_bytes());
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        f32::from(digest[0]) / 255.0
    }
}

#[async_trait]
impl TextPipeline for MockPipeline {
    fn task(&self) -> PipelineTask {
        self.task
    }

    async fn classify(&self, text: &str, labels: &[&str]) -> Result<TaxonomyResult> {
        let mut calls = Arc::clone(&self.calls).lock_owned().await;
        // Suspend while the state is held, as real inference would on its
        // blocking task; concurrent callers must queue here, not fail.
        tokio::task::yield_now().await;
        *calls += 1;

        let pairs = labels
            .iter()
            .map(|l| ((*l).to_string(), self.score(text, l)))
            .collect();
        Ok(TaxonomyResult::from_pairs(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_progress() -> ProgressCallback {
        Arc::new(|_| {})
    }

    #[tokio::test]
    async fn mock_pipeline_is_deterministic() {
        let rt = MockRuntime::new();
        let p = rt
            .load_pipeline(PipelineTask::ZeroShotClassification, "m", no_progress())
            .await
            .unwrap();
        let a = p.classify("rust async book", &["to-read", "done"]).await.unwrap();
        let b = p.classify("rust async book", &["to-read", "done"]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn mock_pipeline_scores_all_labels_sorted() {
        let rt = MockRuntime::new();
        let p = rt
            .load_pipeline(PipelineTask::ZeroShotClassification, "m", no_progress())
            .await
            .unwrap();
        let r = p
            .classify("checkout cart", &["informational", "navigational", "transactional"])
            .await
            .unwrap();
        assert_eq!(r.labels.len(), 3);
        assert!(r.scores.windows(2).all(|w| w[0] >= w[1]), "sorted descending");
        assert!(r.scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[tokio::test]
    async fn concurrent_calls_on_one_pipeline_all_succeed() {
        let p = MockPipeline::new(PipelineTask::ZeroShotClassification, "m");
        let (a, b, c) = tokio::join!(
            p.classify("tab signal", &["informational", "navigational"]),
            p.classify("tab signal", &["to-read", "done"]),
            p.classify("tab signal", &["content", "search"]),
        );
        assert_eq!(a.unwrap().labels.len(), 2);
        assert_eq!(b.unwrap().labels.len(), 2);
        assert_eq!(c.unwrap().labels.len(), 2);
        // every caller queued and completed rather than failing fast
        assert_eq!(p.completed_calls(), 3);
    }

    #[tokio::test]
    async fn scripted_failure_errors() {
        let rt = MockRuntime::new();
        rt.fail_model("broken");
        let err = rt
            .load_pipeline(PipelineTask::Embedding, "broken", no_progress())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Runtime(_)));
    }

    #[tokio::test]
    async fn progress_events_fire_in_order() {
        let rt = MockRuntime::new();
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let cb: ProgressCallback = Arc::new(move |e| sink.lock().push(e));
        let _ = rt
            .load_pipeline(PipelineTask::TokenTagging, "m", cb)
            .await
            .unwrap();
        let events = events.lock();
        assert!(matches!(events[0], ProgressEvent::Initiate { .. }));
        assert!(matches!(events[1], ProgressEvent::Progress { progress: 50, .. }));
        assert!(matches!(events[2], ProgressEvent::Done { .. }));
    }

    #[tokio::test]
    async fn load_order_is_recorded() {
        let rt = MockRuntime::new();
        let _ = rt
            .load_pipeline(PipelineTask::ZeroShotClassification, "a", no_progress())
            .await;
        let _ = rt
            .load_pipeline(PipelineTask::Embedding, "b", no_progress())
            .await;
        assert_eq!(rt.load_order(), vec!["a", "b"]);
    }
}
