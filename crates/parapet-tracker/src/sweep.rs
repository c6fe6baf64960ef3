//! Idle-key sweeper
//!
//! Prune-on-touch keeps every *active* key's window bounded, but an address
//! that stops sending traffic leaves an empty window (and possibly an
//! expired ban) behind forever. Under a churn of distinct attacker addresses
//! that residue is a slow memory leak. The sweeper runs off the decision
//! path and removes it periodically.
//!
//! Running the sweeper is optional: decision semantics are identical with it
//! disabled, only the memory bound changes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::banlist::BanList;
use crate::window::SlidingWindowTracker;

/// Spawns a background task sweeping the given trackers and ban list.
///
/// Each tick removes keys with empty post-prune windows and bans that have
/// expired. The returned handle can be aborted at shutdown; the task holds
/// only `Arc`s and needs no other teardown.
pub fn spawn_sweeper(
    trackers: Vec<Arc<SlidingWindowTracker>>,
    bans: Arc<BanList>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = Instant::now();
            let idle_keys: usize = trackers.iter().map(|t| t.sweep(now)).sum();
            let expired_bans = bans.sweep(now);
            if idle_keys > 0 || expired_bans > 0 {
                debug!(idle_keys, expired_bans, "idle-key sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::TrackerConfig;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sweeper_clears_idle_state() {
        let tracker = Arc::new(
            SlidingWindowTracker::new(TrackerConfig::new(Duration::from_millis(40), 50)).unwrap(),
        );
        let bans = Arc::new(BanList::new(Duration::from_millis(40), []).unwrap());

        let now = Instant::now();
        tracker.record_and_check("ghost", now);
        bans.ban("ghost", now);
        assert_eq!(tracker.tracked_keys(), 1);
        assert_eq!(bans.active_bans(), 1);

        let handle = spawn_sweeper(
            vec![Arc::clone(&tracker)],
            Arc::clone(&bans),
            Duration::from_millis(20),
        );

        // Generous margin over window + interval to keep this deterministic.
        tokio::time::sleep(Duration::from_millis(250)).await;
        handle.abort();

        assert_eq!(tracker.tracked_keys(), 0);
        assert_eq!(bans.active_bans(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sweeper_keeps_live_state() {
        let tracker = Arc::new(
            SlidingWindowTracker::new(TrackerConfig::new(Duration::from_secs(60), 50)).unwrap(),
        );
        let bans = Arc::new(BanList::new(Duration::from_secs(60), []).unwrap());

        tracker.record_and_check("active", Instant::now());
        bans.ban("active", Instant::now());

        let handle = spawn_sweeper(
            vec![Arc::clone(&tracker)],
            Arc::clone(&bans),
            Duration::from_millis(20),
        );
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert_eq!(tracker.tracked_keys(), 1);
        assert_eq!(bans.active_bans(), 1);
    }
}
