//! Settings loading: defaults → user file (deep-merged) → env overrides.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::types::TabsenseSettings;

/// Path of the user settings file: `~/.tabsense/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(format!("{home}/.tabsense/settings.json"))
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<TabsenseSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`, deep-merging the file's JSON over compiled
/// defaults, then applying `TABSENSE_*` env overrides and validation.
///
/// A missing file is not an error: defaults (plus env overrides) apply.
pub fn load_settings_from_path(path: &Path) -> Result<TabsenseSettings> {
    let defaults = serde_json::to_value(TabsenseSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let user: serde_json::Value = serde_json::from_str(&raw)?;
        deep_merge(defaults, user)
    } else {
        tracing::debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: TabsenseSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Deep-merge `overlay` onto `base`.
///
/// Objects merge recursively; any other value type in `overlay` replaces
/// the base value wholesale.
pub fn deep_merge(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    match (base, overlay) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                let _ = base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Apply `TABSENSE_*` environment variable overrides (highest priority).
fn apply_env_overrides(settings: &mut TabsenseSettings) {
    if let Ok(v) = std::env::var("TABSENSE_ENABLED") {
        settings.enabled = v == "1" || v.eq_ignore_ascii_case("true");
    }
    if let Ok(v) = std::env::var("TABSENSE_ARTIFACT_DIR")
        && !v.is_empty()
    {
        settings.models.artifact_dir = v;
    }
    if let Ok(v) = std::env::var("TABSENSE_HISTORY_DB")
        && !v.is_empty()
    {
        settings.history.db_path = v;
    }
}
