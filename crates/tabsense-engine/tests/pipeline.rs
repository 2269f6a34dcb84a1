//! End-to-end annotation pipeline tests: a real sqlite store doing double
//! duty as history source and status sink, a mock inference runtime, and
//! the full orchestrator on top.

use std::sync::Arc;

use tabsense_core::{Tab, time};
use tabsense_engine::{NoHints, TabIntelligence};
use tabsense_history::{HistoryStore, SqliteHistoryStore};
use tabsense_models::{
    InferenceRuntime, MODELS_STATUS_KEY, MockRuntime, ModelManager, ModelStatus, RuntimeFactory,
    StatusStore,
};
use tabsense_settings::{ModelSettings, TabsenseSettings};

fn tab(id: i64, url: &str, title: &str) -> Tab {
    Tab {
        id,
        url: url.into(),
        title: title.into(),
        last_used: Some(time::now_ms()),
        inactive: false,
    }
}

struct Harness {
    intel: TabIntelligence,
    manager: Arc<ModelManager>,
    runtime: Arc<MockRuntime>,
    store: Arc<SqliteHistoryStore>,
}

fn harness() -> Harness {
    let store = Arc::new(SqliteHistoryStore::open_in_memory().unwrap());
    let runtime = Arc::new(MockRuntime::new());
    let rt = Arc::clone(&runtime);
    let factory: RuntimeFactory =
        Box::new(move || Ok(Arc::clone(&rt) as Arc<dyn InferenceRuntime>));
    let manager = Arc::new(ModelManager::new(
        factory,
        Arc::clone(&store) as Arc<dyn StatusStore>,
        &ModelSettings::default(),
    ));
    let intel = TabIntelligence::new(
        Arc::clone(&manager),
        Arc::clone(&store) as Arc<dyn HistoryStore>,
        Arc::new(NoHints),
        Arc::new(TabsenseSettings::default()),
    );
    Harness {
        intel,
        manager,
        runtime,
        store,
    }
}

#[tokio::test]
async fn full_pipeline_annotates_a_mixed_batch() {
    let h = harness();
    h.store
        .record_visit("github.com", time::now_ms() - 60_000, "development")
        .unwrap();
    h.store
        .record_visit("github.com", time::now_ms() - 30_000, "development")
        .unwrap();
    h.store
        .record_visit("github.com", time::now_ms() - 10_000, "development")
        .unwrap();
    let _ = h.manager.preload_lightweight_models().await;

    let tabs = vec![
        tab(1, "https://github.com/rust-lang/rust/pull/1", "Tracking PR"),
        tab(2, "https://fresh.example/article", "An article nobody read"),
        tab(3, "chrome://settings", ""),
    ];
    let out = h.intel.annotate_batch(&tabs).await;
    assert_eq!(out.len(), 3);

    // tab 1: all three sources present
    assert_eq!(out[0].rule.category, "development");
    let hist = out[0].history.as_ref().unwrap();
    assert_eq!(hist.visit_count, 3);
    assert!(hist.safe_to_close);
    let c = out[0].classification.as_ref().unwrap();
    assert_eq!(c.intent.labels.len(), 3);
    assert_eq!(c.status.labels.len(), 5);

    // tab 2: unseen domain synthesizes new-domain history
    assert!(out[1].history.as_ref().unwrap().is_new);
    assert!(out[1].classification.is_some());

    // tab 3: internal page gets rules only
    assert_eq!(out[2].rule.category, "other");
    assert!(out[2].history.is_none());
    assert!(out[2].classification.is_none());
}

#[tokio::test]
async fn model_status_is_observable_through_the_sqlite_store() {
    let h = harness();

    // registry construction already published the all-pending map
    let v = h.store.get(MODELS_STATUS_KEY).unwrap().unwrap();
    assert_eq!(v["classifier"]["status"], "pending");

    let _ = h.manager.preload_model("classifier").await.unwrap();
    let v = h.store.get(MODELS_STATUS_KEY).unwrap().unwrap();
    assert_eq!(v["classifier"]["status"], "ready");
    assert_eq!(v["classifier"]["progress"], 100);
    assert_eq!(v["tagger"]["status"], "pending");
}

#[tokio::test]
async fn one_broken_model_does_not_block_annotation() {
    let h = harness();
    h.runtime.fail_model(&ModelSettings::default().tagger_model);

    let result = h.manager.preload_all_models().await;
    assert!(result["classifier"].is_some());
    assert!(result["tagger"].is_none());
    assert_eq!(
        h.manager.get_status()["tagger"].status,
        ModelStatus::Error
    );

    // classification still runs off the healthy classifier
    let out = h
        .intel
        .annotate_batch(&[tab(1, "https://docs.rs/serde", "serde docs")])
        .await;
    assert!(out[0].classification.is_some());
}

#[tokio::test]
async fn unready_models_degrade_to_rules_and_history() {
    let h = harness();
    h.store
        .record_visit("news.ycombinator.com", time::now_ms() - 1_000, "news")
        .unwrap();
    // no preload at all

    let out = h
        .intel
        .annotate_batch(&[tab(1, "https://news.ycombinator.com/item?id=1", "HN")])
        .await;
    assert_eq!(out[0].rule.category, "news");
    assert!(out[0].history.is_some());
    assert!(out[0].classification.is_none());
}

#[tokio::test]
async fn classification_is_deterministic_across_batches() {
    let h = harness();
    let _ = h.manager.preload_lightweight_models().await;
    let t = tab(1, "https://docs.rs/tokio/latest/tokio", "tokio - Rust");

    let a = h.intel.annotate_tab(&t).await;
    let b = h.intel.annotate_tab(&t).await;
    assert_eq!(a.classification, b.classification);
}

#[tokio::test]
async fn annotation_serializes_to_camel_case_wire_format() {
    let h = harness();
    let _ = h.manager.preload_lightweight_models().await;

    let out = h
        .intel
        .annotate_tab(&tab(7, "https://github.com/a/b", "a/b"))
        .await;
    let v = serde_json::to_value(&out).unwrap();

    // tab fields are flattened into the annotation object
    assert_eq!(v["id"], 7);
    assert_eq!(v["url"], "https://github.com/a/b");
    assert_eq!(v["rule"]["category"], "development");
    assert!(v["classification"]["contentType"]["labels"].is_array());
    assert_eq!(v["history"]["isNew"], true);
    assert_eq!(v["history"]["visitCount"], 0);
    assert_eq!(v["history"]["safeToClose"], false);
}
