//! # tabsense-settings
//!
//! Configuration management with layered sources for the tabsense engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`TabsenseSettings::default()`]
//! 2. **User file** — `~/.tabsense/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `TABSENSE_*` overrides (highest priority)
//!
//! The global singleton is reloadable: when the UI settings screen writes
//! new values to disk, [`reload_settings_from_path`] swaps the cached value
//! so all subsequent [`get_settings`] calls return fresh data.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

/// Global settings singleton.
///
/// `RwLock<Option<Arc<TabsenseSettings>>>` rather than `OnceLock` so the
/// cached value can be swapped when the UI updates settings. Reads are a
/// shared lock plus `Arc::clone`; writes only happen on reload.
static SETTINGS: RwLock<Option<Arc<TabsenseSettings>>> = RwLock::new(None);

/// Get the global settings instance.
///
/// First call loads from `~/.tabsense/settings.json` with env overrides;
/// later calls return the cached value. Load failures fall back to compiled
/// defaults. Returns an `Arc` so callers hold a consistent snapshot even if
/// another thread reloads concurrently.
pub fn get_settings() -> Arc<TabsenseSettings> {
    {
        let guard = SETTINGS.read();
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write();
    // Another thread may have initialized between the locks.
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            TabsenseSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Initialize the global settings with a specific value.
///
/// Replaces any previously cached settings. Useful for tests and embedders
/// that construct settings programmatically.
pub fn init_settings(settings: TabsenseSettings) {
    *SETTINGS.write() = Some(Arc::new(settings));
}

/// Reload settings from a specific file path and swap the global cache.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            TabsenseSettings::default()
        }
    });
    *SETTINGS.write() = Some(new);
    tracing::info!(?path, "settings reloaded from disk");
}

/// Reset the global settings cache (test-only).
#[cfg(test)]
pub(crate) fn reset_settings() {
    *SETTINGS.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that mutate the global SETTINGS static hold this lock to avoid
    /// racing with each other (tests run in parallel threads).
    static SETTINGS_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn init_settings_sets_custom_value() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        let custom = TabsenseSettings {
            enabled: false,
            ..TabsenseSettings::default()
        };
        init_settings(custom);
        assert!(!get_settings().enabled);
        reset_settings();
    }

    #[test]
    fn reload_from_path_updates_cached_value() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        init_settings(TabsenseSettings::default());
        assert!(get_settings().features.enrich_tab_cards);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"features": {"enrichTabCards": false}}"#).unwrap();

        reload_settings_from_path(&path);

        let updated = get_settings();
        assert!(!updated.features.enrich_tab_cards);
        // other defaults preserved by the deep merge
        assert!(updated.features.classify_tabs);
        reset_settings();
    }

    #[test]
    fn snapshot_isolation_via_arc() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        init_settings(TabsenseSettings::default());

        let snapshot = get_settings();
        assert!(snapshot.enabled);

        init_settings(TabsenseSettings {
            enabled: false,
            ..TabsenseSettings::default()
        });

        // snapshot still sees the old value; fresh get sees the new one
        assert!(snapshot.enabled);
        assert!(!get_settings().enabled);
        reset_settings();
    }
}
