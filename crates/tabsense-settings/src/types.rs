//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the UI's JSON
//! wire format, and `#[serde(default)]` so partial settings files work —
//! missing fields take their production default during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings for the tabsense engine.
///
/// Loaded from `~/.tabsense/settings.json` with defaults applied for
/// missing fields; `TABSENSE_*` environment variables override on top.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabsenseSettings {
    /// Settings schema version.
    pub version: String,
    /// Master switch. When off, every engine entry point short-circuits
    /// without touching models or the store.
    pub enabled: bool,
    /// Per-feature toggles.
    pub features: FeatureSettings,
    /// Model artifact and naming configuration.
    pub models: ModelSettings,
    /// Classification signal bounds.
    pub classification: ClassificationSettings,
    /// History store configuration.
    pub history: HistorySettings,
}

impl Default for TabsenseSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            enabled: true,
            features: FeatureSettings::default(),
            models: ModelSettings::default(),
            classification: ClassificationSettings::default(),
            history: HistorySettings::default(),
        }
    }
}

/// Per-feature toggles surfaced in the UI settings screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureSettings {
    /// Annotate tab cards with history enrichment.
    pub enrich_tab_cards: bool,
    /// Run ML classification on tabs.
    pub classify_tabs: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            enrich_tab_cards: true,
            classify_tabs: true,
        }
    }
}

/// Model artifact configuration.
///
/// `artifact_dir` is the local-only root the inference runtime resolves
/// models from; nothing is ever fetched over the network at load time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Root directory containing bundled model artifacts.
    pub artifact_dir: String,
    /// Model name for the zero-shot multi-label classifier.
    pub classifier_model: String,
    /// Model name for the token tagger.
    pub tagger_model: String,
    /// Model name for the embedder.
    pub embedder_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Self {
            artifact_dir: format!("{home}/.tabsense/models"),
            classifier_model: "nli-deberta-v3-xsmall".to_string(),
            tagger_model: "bert-base-ner".to_string(),
            embedder_model: "all-minilm-l6-v2".to_string(),
        }
    }
}

/// Bounds on the text signal built for classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassificationSettings {
    /// Maximum signal length in characters (title + domain + path).
    pub max_signal_chars: usize,
    /// Minimum signal length; shorter inputs are rejected as "no signal".
    pub min_signal_chars: usize,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            max_signal_chars: 512,
            min_signal_chars: 3,
        }
    }
}

/// History store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistorySettings {
    /// Path to the sqlite database holding per-domain visit aggregates.
    pub db_path: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Self {
            db_path: format!("{home}/.tabsense/history.db"),
        }
    }
}

impl TabsenseSettings {
    /// Correct invalid invariants after loading.
    ///
    /// Out-of-range values are fixed with a warning rather than rejected,
    /// so users get corrected behavior instead of a confusing error.
    pub fn validate(&mut self) {
        if self.classification.min_signal_chars > self.classification.max_signal_chars {
            tracing::warn!(
                min = self.classification.min_signal_chars,
                max = self.classification.max_signal_chars,
                "minSignalChars > maxSignalChars, correcting"
            );
            self.classification.min_signal_chars = self.classification.max_signal_chars;
        }
        if self.classification.max_signal_chars == 0 {
            tracing::warn!("maxSignalChars is 0, restoring default");
            self.classification.max_signal_chars = ClassificationSettings::default().max_signal_chars;
        }
    }
}
