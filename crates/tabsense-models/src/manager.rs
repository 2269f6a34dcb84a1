//! Model lifecycle manager: the exclusive writer of the descriptor registry.
//!
//! Owns one [`ModelDescriptor`] per logical model, drives the
//! `pending → loading → downloading → ready | error` state machine, and
//! publishes the full descriptor map to the shared status store after every
//! transition so polling surfaces observe each step.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use tabsense_settings::ModelSettings;

use crate::descriptor::{ModelDescriptor, ModelStatus, PipelineTask, ProgressEvent};
use crate::errors::{ModelError, Result};
use crate::runtime::{InferenceRuntime, ProgressCallback, TextPipeline};
use crate::status_store::{MODELS_STATUS_KEY, StatusStore};

/// All registered model keys, in preload order.
pub const MODEL_KEYS: &[&str] = &["classifier", "tagger", "embedder"];

/// The fixed lightweight subset, in preload order.
///
/// The classifier is the only model the classification path strictly needs;
/// the tagger and embedder are heavy optional capability.
pub const LIGHTWEIGHT_KEYS: &[&str] = &["classifier"];

/// Factory producing the inference runtime on first use.
///
/// The runtime is constructed lazily exactly once and memoized; the factory
/// must configure it for local-artifact-only resolution.
pub type RuntimeFactory = Box<dyn Fn() -> Result<Arc<dyn InferenceRuntime>> + Send + Sync>;

/// Listener notified of every progress event, keyed by model.
pub type ProgressListener = Arc<dyn Fn(&str, &ProgressEvent) + Send + Sync>;

type DescriptorMap = Arc<RwLock<HashMap<String, ModelDescriptor>>>;

/// Loads, tracks, and persists the readiness state of named inference
/// pipelines backed by locally bundled model artifacts.
pub struct ModelManager {
    runtime_factory: RuntimeFactory,
    runtime: tokio::sync::OnceCell<Arc<dyn InferenceRuntime>>,
    descriptors: DescriptorMap,
    pipelines: RwLock<HashMap<String, Arc<dyn TextPipeline>>>,
    status_store: Arc<dyn StatusStore>,
    listener: Arc<RwLock<Option<ProgressListener>>>,
    /// Serializes pipeline loads: resource-heavy pipelines compete for
    /// memory, so total-memory-bound correctness beats load-time parallelism.
    load_gate: tokio::sync::Mutex<()>,
}

impl ModelManager {
    /// Create the registry with one `pending` descriptor per model key and
    /// publish the initial map.
    pub fn new(
        runtime_factory: RuntimeFactory,
        status_store: Arc<dyn StatusStore>,
        models: &ModelSettings,
    ) -> Self {
        let mut map = HashMap::new();
        for &key in MODEL_KEYS {
            let (task, location) = match key {
                "classifier" => (
                    PipelineTask::ZeroShotClassification,
                    models.classifier_model.as_str(),
                ),
                "tagger" => (PipelineTask::TokenTagging, models.tagger_model.as_str()),
                _ => (PipelineTask::Embedding, models.embedder_model.as_str()),
            };
            let _ = map.insert(
                key.to_string(),
                ModelDescriptor::pending(key, task, location),
            );
        }

        publish(&status_store, &map);
        Self {
            runtime_factory,
            runtime: tokio::sync::OnceCell::new(),
            descriptors: Arc::new(RwLock::new(map)),
            pipelines: RwLock::new(HashMap::new()),
            status_store,
            listener: Arc::new(RwLock::new(None)),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Register a progress listener (replaces any previous one).
    pub fn set_progress_listener(&self, listener: ProgressListener) {
        *self.listener.write() = Some(listener);
    }

    /// Snapshot of every descriptor. Pollers get clones, never references
    /// into the registry.
    pub fn get_status(&self) -> HashMap<String, ModelDescriptor> {
        self.descriptors.read().clone()
    }

    /// A cached, ready pipeline handle for `key`.
    ///
    /// Does not trigger a load: classification fails with a
    /// model-unavailable condition rather than silently substituting a
    /// default distribution.
    pub fn pipeline(&self, key: &str) -> Result<Arc<dyn TextPipeline>> {
        if !self.descriptors.read().contains_key(key) {
            return Err(ModelError::UnknownModel(key.to_string()));
        }
        self.pipelines
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ModelError::NotReady(key.to_string()))
    }

    /// Load one model, driving its descriptor through the state machine.
    ///
    /// Idempotent for a `ready` model: returns the cached handle without
    /// re-invoking the runtime. An unknown key fails immediately without
    /// mutating anything.
    pub async fn preload_model(&self, key: &str) -> Result<Arc<dyn TextPipeline>> {
        let descriptor = self
            .descriptors
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(key.to_string()))?;

        if let Some(cached) = self.pipelines.read().get(key) {
            debug!(key, "model already ready, returning cached handle");
            return Ok(Arc::clone(cached));
        }

        let _gate = self.load_gate.lock().await;
        // A concurrent caller may have finished this load while we waited.
        if let Some(cached) = self.pipelines.read().get(key) {
            return Ok(Arc::clone(cached));
        }

        self.transition(key, |d| {
            d.status = ModelStatus::Loading;
            d.progress = None;
            d.error = None;
        });

        let runtime = self.runtime().await;
        let runtime = match runtime {
            Ok(rt) => rt,
            Err(e) => {
                self.fail(key, &e);
                return Err(e);
            }
        };

        let on_progress = self.progress_callback(key);
        match runtime
            .load_pipeline(descriptor.task, &descriptor.artifact_location, on_progress)
            .await
        {
            Ok(pipeline) => {
                self.transition(key, |d| {
                    d.status = ModelStatus::Ready;
                    d.progress = Some(100);
                    d.error = None;
                });
                let _ = self
                    .pipelines
                    .write()
                    .insert(key.to_string(), Arc::clone(&pipeline));
                info!(key, "model ready");
                Ok(pipeline)
            }
            Err(e) => {
                self.fail(key, &e);
                Err(e)
            }
        }
    }

    /// Load every registered model, strictly sequentially.
    ///
    /// A failing model is recorded as `None` in the result map and does not
    /// abort loading of subsequent models.
    pub async fn preload_all_models(&self) -> HashMap<String, Option<Arc<dyn TextPipeline>>> {
        self.preload_keys(MODEL_KEYS).await
    }

    /// Load the fixed lightweight subset, with the same per-model isolation.
    pub async fn preload_lightweight_models(
        &self,
    ) -> HashMap<String, Option<Arc<dyn TextPipeline>>> {
        self.preload_keys(LIGHTWEIGHT_KEYS).await
    }

    async fn preload_keys(
        &self,
        keys: &[&str],
    ) -> HashMap<String, Option<Arc<dyn TextPipeline>>> {
        let mut result = HashMap::new();
        for &key in keys {
            let handle = match self.preload_model(key).await {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(key, error = %e, "model preload failed, continuing with siblings");
                    None
                }
            };
            let _ = result.insert(key.to_string(), handle);
        }
        result
    }

    /// Lazily construct and memoize the inference runtime.
    async fn runtime(&self) -> Result<Arc<dyn InferenceRuntime>> {
        self.runtime
            .get_or_try_init(|| async { (self.runtime_factory)() })
            .await
            .cloned()
    }

    fn fail(&self, key: &str, error: &ModelError) {
        let message = error.to_string();
        warn!(key, error = %message, "model load failed");
        self.transition(key, move |d| {
            d.status = ModelStatus::Error;
            d.error = Some(message.clone());
        });
    }

    /// Runtime progress events mutate the descriptor (`downloading` with a
    /// percentage) and are forwarded to the registered listener.
    fn progress_callback(&self, key: &str) -> ProgressCallback {
        let key = key.to_string();
        let descriptors = Arc::clone(&self.descriptors);
        let status_store = Arc::clone(&self.status_store);
        let listener = Arc::clone(&self.listener);
        Arc::new(move |event: ProgressEvent| {
            if let ProgressEvent::Progress { progress, .. } = &event {
                let progress = *progress;
                transition_in(&descriptors, &status_store, &key, |d| {
                    d.status = ModelStatus::Downloading;
                    d.progress = Some(progress.min(100));
                });
            }
            if let Some(l) = listener.read().as_ref() {
                l(&key, &event);
            }
        })
    }

    fn transition(&self, key: &str, apply: impl FnOnce(&mut ModelDescriptor)) {
        transition_in(&self.descriptors, &self.status_store, key, apply);
    }
}

/// Apply a transition as a single atomic replace of one descriptor entry,
/// then publish the whole map.
fn transition_in(
    descriptors: &DescriptorMap,
    status_store: &Arc<dyn StatusStore>,
    key: &str,
    apply: impl FnOnce(&mut ModelDescriptor),
) {
    let snapshot = {
        let mut map = descriptors.write();
        let Some(current) = map.get(key) else {
            return;
        };
        let mut next = current.clone();
        apply(&mut next);
        let _ = map.insert(key.to_string(), next);
        map.clone()
    };
    publish(status_store, &snapshot);
}

fn publish(status_store: &Arc<dyn StatusStore>, map: &HashMap<String, ModelDescriptor>) {
    match serde_json::to_value(map) {
        Ok(value) => {
            if let Err(e) = status_store.set(MODELS_STATUS_KEY, value) {
                warn!(error = %e, "failed to publish model status");
            }
        }
        Err(e) => warn!(error = %e, "failed to serialize model status"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::status_store::MemoryStatusStore;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;

    struct Fixture {
        manager: ModelManager,
        runtime: Arc<MockRuntime>,
        store: Arc<MemoryStatusStore>,
    }

    fn fixture() -> Fixture {
        let runtime = Arc::new(MockRuntime::new());
        let store = Arc::new(MemoryStatusStore::new());
        let rt = Arc::clone(&runtime);
        let factory: RuntimeFactory =
            Box::new(move || Ok(Arc::clone(&rt) as Arc<dyn InferenceRuntime>));
        let manager = ModelManager::new(
            factory,
            Arc::clone(&store) as Arc<dyn StatusStore>,
            &ModelSettings::default(),
        );
        Fixture {
            manager,
            runtime,
            store,
        }
    }

    #[test]
    fn registry_starts_all_pending() {
        let f = fixture();
        let status = f.manager.get_status();
        assert_eq!(status.len(), MODEL_KEYS.len());
        assert!(status.values().all(|d| d.status == ModelStatus::Pending));
    }

    #[test]
    fn initial_map_is_published() {
        let f = fixture();
        let v = f.store.get(MODELS_STATUS_KEY).unwrap().unwrap();
        assert_eq!(v["classifier"]["status"], "pending");
        assert_eq!(v["embedder"]["status"], "pending");
    }

    #[tokio::test]
    async fn unknown_key_fails_without_mutation() {
        let f = fixture();
        let before = f.manager.get_status();
        let err = f.manager.preload_model("summarizer").await.unwrap_err();
        assert_matches!(err, ModelError::UnknownModel(k) if k == "summarizer");
        assert_eq!(f.manager.get_status(), before);
    }

    #[tokio::test]
    async fn preload_reaches_ready_and_publishes() {
        let f = fixture();
        let _ = f.manager.preload_model("classifier").await.unwrap();

        let status = f.manager.get_status();
        assert_eq!(status["classifier"].status, ModelStatus::Ready);
        assert_eq!(status["classifier"].error, None);

        let v = f.store.get(MODELS_STATUS_KEY).unwrap().unwrap();
        assert_eq!(v["classifier"]["status"], "ready");
    }

    #[tokio::test]
    async fn preload_ready_model_is_idempotent() {
        let f = fixture();
        let first = f.manager.preload_model("classifier").await.unwrap();
        let second = f.manager.preload_model("classifier").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        // the runtime was only invoked once
        assert_eq!(f.runtime.load_order().len(), 1);
    }

    #[tokio::test]
    async fn preload_all_isolates_failures() {
        let f = fixture();
        f.runtime.fail_model(&ModelSettings::default().tagger_model);

        let result = f.manager.preload_all_models().await;
        assert_eq!(result.len(), 3);
        assert!(result["classifier"].is_some());
        assert!(result["tagger"].is_none());
        assert!(result["embedder"].is_some());

        let status = f.manager.get_status();
        assert_eq!(status["tagger"].status, ModelStatus::Error);
        assert!(
            status["tagger"]
                .error
                .as_deref()
                .unwrap()
                .contains("scripted failure")
        );
        assert_eq!(status["embedder"].status, ModelStatus::Ready);
    }

    #[tokio::test]
    async fn preload_all_is_strictly_sequential_in_declared_order() {
        let f = fixture();
        let _ = f.manager.preload_all_models().await;
        let models = ModelSettings::default();
        assert_eq!(
            f.runtime.load_order(),
            vec![
                models.classifier_model,
                models.tagger_model,
                models.embedder_model
            ]
        );
    }

    #[tokio::test]
    async fn lightweight_subset_loads_only_classifier() {
        let f = fixture();
        let result = f.manager.preload_lightweight_models().await;
        assert_eq!(result.len(), 1);
        assert!(result["classifier"].is_some());
        assert_eq!(f.manager.get_status()["tagger"].status, ModelStatus::Pending);
    }

    #[tokio::test]
    async fn pipeline_before_preload_is_not_ready() {
        let f = fixture();
        assert_matches!(
            f.manager.pipeline("classifier").unwrap_err(),
            ModelError::NotReady(_)
        );
        let _ = f.manager.preload_model("classifier").await.unwrap();
        assert!(f.manager.pipeline("classifier").is_ok());
    }

    #[tokio::test]
    async fn pipeline_unknown_key() {
        let f = fixture();
        assert_matches!(
            f.manager.pipeline("nope").unwrap_err(),
            ModelError::UnknownModel(_)
        );
    }

    #[tokio::test]
    async fn progress_events_reach_listener_and_descriptor() {
        let f = fixture();
        let seen: Arc<Mutex<Vec<(String, ProgressEvent)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        f.manager
            .set_progress_listener(Arc::new(move |key, event| {
                sink.lock().push((key.to_string(), event.clone()));
            }));

        let _ = f.manager.preload_model("classifier").await.unwrap();

        let seen = seen.lock();
        assert!(seen.iter().all(|(k, _)| k == "classifier"));
        assert!(
            seen.iter()
                .any(|(_, e)| matches!(e, ProgressEvent::Progress { progress: 50, .. }))
        );
        // the 50% event transitioned the descriptor through `downloading`
        // before the final `ready`; the publish trail ends at ready
        assert_eq!(
            f.manager.get_status()["classifier"].status,
            ModelStatus::Ready
        );
    }

    #[tokio::test]
    async fn runtime_factory_error_marks_descriptor() {
        let store = Arc::new(MemoryStatusStore::new());
        let factory: RuntimeFactory =
            Box::new(|| Err(ModelError::Runtime("no backend on this host".into())));
        let manager = ModelManager::new(
            factory,
            Arc::clone(&store) as Arc<dyn StatusStore>,
            &ModelSettings::default(),
        );

        let err = manager.preload_model("classifier").await.unwrap_err();
        assert_matches!(err, ModelError::Runtime(_));
        assert_eq!(
            manager.get_status()["classifier"].status,
            ModelStatus::Error
        );
    }
}
