//! Wait-free protection-toggle snapshots.
//!
//! Every decision reads the toggles; the file they live in changes rarely.
//! The gate keeps the current value behind an [`ArcSwap`] so readers never
//! take a lock, and a background task refreshes it from the store on a
//! timer. A corrupt or unreadable file keeps the last-known-good value
//! rather than flapping protections off and on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use parapet_audit::{ConfigStore, FeatureToggles};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shared toggle snapshot with atomic replacement.
pub struct ConfigGate {
    toggles: ArcSwap<FeatureToggles>,
    refresh_failures: AtomicU64,
}

impl ConfigGate {
    /// Creates a gate holding `initial`.
    #[must_use]
    pub fn new(initial: FeatureToggles) -> Self {
        Self {
            toggles: ArcSwap::from_pointee(initial),
            refresh_failures: AtomicU64::new(0),
        }
    }

    /// Current toggles. Wait-free; safe on every decision.
    #[must_use]
    pub fn snapshot(&self) -> FeatureToggles {
        **self.toggles.load()
    }

    /// Atomically replaces the toggles.
    pub fn install(&self, toggles: FeatureToggles) {
        self.toggles.store(Arc::new(toggles));
    }

    /// Number of refresh attempts that could not read the store.
    #[must_use]
    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.load(Ordering::Relaxed)
    }

    /// One refresh step: read the store and install the result.
    ///
    /// On failure the previous snapshot stays installed and the failure
    /// counter increments.
    pub fn refresh_from(&self, store: &ConfigStore) {
        match store.try_load() {
            Ok(toggles) => {
                if toggles != self.snapshot() {
                    debug!(?toggles, "protection toggles updated");
                }
                self.install(toggles);
            }
            Err(e) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                warn!(path = %store.path().display(), error = %e,
                    "toggle refresh failed, keeping last known value");
            }
        }
    }

    /// Spawns a task that refreshes from `store` every `every`.
    ///
    /// The task runs until the handle is aborted or the runtime shuts
    /// down. An immediate first refresh picks up the file state at spawn.
    pub fn spawn_refresher(
        self: Arc<Self>,
        store: ConfigStore,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                self.refresh_from(&store);
            }
        })
    }
}

impl std::fmt::Debug for ConfigGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigGate")
            .field("toggles", &self.snapshot())
            .field("refresh_failures", &self.refresh_failures())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_install() {
        let gate = ConfigGate::new(FeatureToggles::default());
        assert!(gate.snapshot().enable_sqli);

        let mut toggles = FeatureToggles::default();
        toggles.enable_sqli = false;
        gate.install(toggles);
        assert!(!gate.snapshot().enable_sqli);
        assert!(gate.snapshot().enable_xss);
    }

    #[test]
    fn test_refresh_reads_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("waf_config.json"));
        let mut toggles = FeatureToggles::default();
        toggles.enable_rate_limit = false;
        store.save(&toggles).unwrap();

        let gate = ConfigGate::new(FeatureToggles::default());
        gate.refresh_from(&store);
        assert!(!gate.snapshot().enable_rate_limit);
        assert_eq!(gate.refresh_failures(), 0);
    }

    #[test]
    fn test_refresh_failure_keeps_last_known_good() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("waf_config.json"));

        let mut toggles = FeatureToggles::default();
        toggles.enable_xss = false;
        let gate = ConfigGate::new(toggles);

        std::fs::write(store.path(), "{half-written").unwrap();
        gate.refresh_from(&store);

        // The corrupt read neither flips toggles nor goes unnoticed.
        assert!(!gate.snapshot().enable_xss);
        assert_eq!(gate.refresh_failures(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresher_task_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("waf_config.json"));
        store.save(&FeatureToggles::default()).unwrap();

        let gate = Arc::new(ConfigGate::new(FeatureToggles::default()));
        let handle = Arc::clone(&gate).spawn_refresher(store.clone(), Duration::from_millis(20));

        let mut toggles = FeatureToggles::default();
        toggles.enable_bruteforce = false;
        store.save(&toggles).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!gate.snapshot().enable_bruteforce);
        handle.abort();
    }
}
