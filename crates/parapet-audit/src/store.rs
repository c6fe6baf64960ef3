//! # Toggle Store
//!
//! Protection toggles live in a small JSON file shared between the engine
//! and the operator surface. The engine re-reads it on a timer; the
//! dashboard and CLI write it through [`ConfigStore::apply`].
//!
//! Loading is deliberately infallible: a missing file self-initializes to
//! the fail-closed defaults (everything on) and a corrupt file falls back
//! to the same defaults without overwriting the operator's bytes, so a
//! half-finished manual edit can be repaired rather than clobbered.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

fn default_true() -> bool {
    true
}

/// Which protection layers are live.
///
/// The field names are the on-disk JSON keys. Unknown keys in the file are
/// ignored and missing keys default to `true`, so a file written by an
/// older build keeps newer layers enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// SQL injection blocking.
    #[serde(default = "default_true")]
    pub enable_sqli: bool,
    /// Cross-site scripting blocking.
    #[serde(default = "default_true")]
    pub enable_xss: bool,
    /// Sliding-window rate limiting.
    #[serde(default = "default_true")]
    pub enable_rate_limit: bool,
    /// Sensitive-endpoint brute-force lockout.
    #[serde(default = "default_true")]
    pub enable_bruteforce: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            enable_sqli: true,
            enable_xss: true,
            enable_rate_limit: true,
            enable_bruteforce: true,
        }
    }
}

/// Partial toggle update, applied over the current file contents.
///
/// `None` fields are left untouched, which lets the operator surface POST
/// only the switches it shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ToggleUpdate {
    pub enable_sqli: Option<bool>,
    pub enable_xss: Option<bool>,
    pub enable_rate_limit: Option<bool>,
    pub enable_bruteforce: Option<bool>,
}

impl ToggleUpdate {
    /// Returns `toggles` with the set fields overridden.
    #[must_use]
    pub fn apply_to(&self, mut toggles: FeatureToggles) -> FeatureToggles {
        if let Some(v) = self.enable_sqli {
            toggles.enable_sqli = v;
        }
        if let Some(v) = self.enable_xss {
            toggles.enable_xss = v;
        }
        if let Some(v) = self.enable_rate_limit {
            toggles.enable_rate_limit = v;
        }
        if let Some(v) = self.enable_bruteforce {
            toggles.enable_bruteforce = v;
        }
        toggles
    }
}

/// File-backed toggle storage.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Binds the store to a JSON file. Nothing is read until [`load`].
    ///
    /// [`load`]: ConfigStore::load
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current toggles, surfacing corruption to the caller.
    ///
    /// A missing file is not an error: it is created with the defaults so
    /// the next editor sees real content, and the defaults are returned.
    /// Callers that can hold a last-known-good value (the engine's config
    /// gate) use this to avoid flapping on a half-written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    /// The file is left untouched in that case.
    pub fn try_load(&self) -> Result<FeatureToggles> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let defaults = FeatureToggles::default();
                if let Err(e) = self.save(&defaults) {
                    warn!(path = %self.path.display(), error = %e,
                        "could not initialize toggle file");
                }
                Ok(defaults)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the current toggles, never failing.
    ///
    /// A corrupt or unreadable file logs a warning and yields the
    /// fail-closed defaults while leaving the file as-is for repair.
    #[must_use]
    pub fn load(&self) -> FeatureToggles {
        self.try_load().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e,
                "toggle file unreadable, using defaults");
            FeatureToggles::default()
        })
    }

    /// Writes the toggles as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, toggles: &FeatureToggles) -> Result<()> {
        let json = serde_json::to_string_pretty(toggles)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Loads, overlays `update`, persists, and returns the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged toggles cannot be written back.
    pub fn apply(&self, update: &ToggleUpdate) -> Result<FeatureToggles> {
        let merged = update.apply_to(self.load());
        self.save(&merged)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("waf_config.json"))
    }

    #[test]
    fn test_defaults_are_all_on() {
        let toggles = FeatureToggles::default();
        assert!(toggles.enable_sqli);
        assert!(toggles.enable_xss);
        assert!(toggles.enable_rate_limit);
        assert!(toggles.enable_bruteforce);
    }

    #[test]
    fn test_load_missing_file_self_initializes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.load(), FeatureToggles::default());
        // The file now exists with real content.
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let back: FeatureToggles = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, FeatureToggles::default());
    }

    #[test]
    fn test_load_corrupt_file_defaults_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{broken").unwrap();

        assert!(store.try_load().is_err());
        assert_eq!(store.load(), FeatureToggles::default());
        // The operator's bytes survive for manual repair.
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{broken");
    }

    #[test]
    fn test_missing_keys_default_on() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"enable_sqli": false}"#).unwrap();

        let toggles = store.load();
        assert!(!toggles.enable_sqli);
        assert!(toggles.enable_xss);
        assert!(toggles.enable_rate_limit);
    }

    #[test]
    fn test_hand_edited_disable_takes_effect() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        // The schema the dashboard and docs describe, written by an editor
        // rather than by save().
        std::fs::write(
            store.path(),
            concat!(
                r#"{"enable_sqli": true, "enable_xss": false,"#,
                r#" "enable_rate_limit": true, "enable_bruteforce": true}"#,
            ),
        )
        .unwrap();

        let toggles = store.load();
        assert!(!toggles.enable_xss);
        assert!(toggles.enable_sqli);
        assert!(toggles.enable_rate_limit);
        assert!(toggles.enable_bruteforce);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let toggles = FeatureToggles {
            enable_sqli: false,
            enable_xss: true,
            enable_rate_limit: false,
            enable_bruteforce: true,
        };
        store.save(&toggles).unwrap();
        assert_eq!(store.load(), toggles);
    }

    #[test]
    fn test_apply_merges_partial_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let update = ToggleUpdate {
            enable_rate_limit: Some(false),
            ..ToggleUpdate::default()
        };
        let merged = store.apply(&update).unwrap();
        assert!(!merged.enable_rate_limit);
        assert!(merged.enable_sqli);

        // A second partial update keeps earlier changes.
        let update = ToggleUpdate {
            enable_xss: Some(false),
            ..ToggleUpdate::default()
        };
        let merged = store.apply(&update).unwrap();
        assert!(!merged.enable_rate_limit);
        assert!(!merged.enable_xss);
    }
}
