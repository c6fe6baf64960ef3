//! # Sliding Window Tracker
//!
//! Per-key event tracking over a fixed time window. One instance tracks one
//! kind of event (request arrivals, sensitive-endpoint hits) for every client
//! address, pruning aged events on every touch.
//!
//! ## Window Semantics
//!
//! After any prune at time `now`, every retained event `e` satisfies
//! `now - e <= window`. Events are appended in arrival order, so the deque
//! stays time-ordered. The threshold check is strict: `count > threshold`
//! trips, `count == threshold` does not.
//!
//! ## Concurrency
//!
//! State lives in a `DashMap` keyed by client address. Entry-level locking
//! serializes calls for the same key (two simultaneous requests from one
//! address cannot race-corrupt that address's window) while calls for
//! different keys proceed in parallel.
//!
//! ## Memory
//!
//! Prune-on-touch bounds each key's storage by the window duration, but a
//! key that stops sending traffic keeps its empty entry until
//! [`SlidingWindowTracker::sweep`] runs (see the crate-level sweeper).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::{Result, TrackerError};

/// Configuration for one tracker instance.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use parapet_tracker::TrackerConfig;
///
/// let config = TrackerConfig::new(Duration::from_secs(10), 50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Window duration; events older than this are pruned.
    pub window: Duration,
    /// Strict trigger threshold: exceeded when `count > threshold`.
    pub threshold: usize,
}

impl TrackerConfig {
    /// Creates a config with the given window and threshold.
    #[must_use]
    pub const fn new(window: Duration, threshold: usize) -> Self {
        Self { window, threshold }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::ZeroWindow`] when the window is zero.
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(TrackerError::ZeroWindow);
        }
        Ok(())
    }
}

/// Outcome of recording one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    /// Events remaining in the window after the prune, including this one.
    pub count: usize,
    /// Whether the count strictly exceeds the threshold.
    pub exceeded: bool,
}

/// Per-key sliding-window event tracker.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use parapet_tracker::{SlidingWindowTracker, TrackerConfig};
///
/// let tracker =
///     SlidingWindowTracker::new(TrackerConfig::new(Duration::from_secs(10), 2)).unwrap();
///
/// let now = Instant::now();
/// assert!(!tracker.record_and_check("10.0.0.1", now).exceeded);
/// assert!(!tracker.record_and_check("10.0.0.1", now).exceeded);
/// // Third event within the window strictly exceeds threshold 2.
/// assert!(tracker.record_and_check("10.0.0.1", now).exceeded);
/// ```
#[derive(Debug)]
pub struct SlidingWindowTracker {
    window: Duration,
    threshold: usize,
    events: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowTracker {
    /// Creates a tracker from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::ZeroWindow`] for a zero window duration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: config.window,
            threshold: config.threshold,
            events: DashMap::new(),
        })
    }

    /// Records one event for `key` at `now` and reports the window state.
    ///
    /// Appends the event, prunes everything older than the window relative
    /// to `now`, and returns the surviving count plus whether it strictly
    /// exceeds the threshold. Same-key calls serialize on the entry lock;
    /// unrelated keys never contend.
    pub fn record_and_check(&self, key: &str, now: Instant) -> WindowStatus {
        let mut entry = self.events.entry(key.to_string()).or_default();
        entry.push_back(now);
        Self::prune(&mut entry, now, self.window);
        let count = entry.len();
        WindowStatus {
            count,
            exceeded: count > self.threshold,
        }
    }

    /// Prunes `key`'s window at `now` without recording, returning the
    /// surviving count. Unknown keys report zero.
    pub fn occupancy(&self, key: &str, now: Instant) -> usize {
        match self.events.get_mut(key) {
            Some(mut entry) => {
                Self::prune(&mut entry, now, self.window);
                entry.len()
            }
            None => 0,
        }
    }

    /// Removes keys whose windows are empty after pruning at `now`.
    ///
    /// Off the decision path; this is what bounds total memory when many
    /// distinct addresses go idle. Returns the number of keys removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.events.len();
        self.events.retain(|_, events| {
            events.retain(|&t| now.duration_since(t) <= self.window);
            !events.is_empty()
        });
        before.saturating_sub(self.events.len())
    }

    /// Number of keys currently holding a window (empty or not).
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.events.len()
    }

    /// The configured window duration.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// The configured strict threshold.
    #[inline]
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    fn prune(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        // duration_since saturates to zero for events recorded "after" now,
        // so slightly out-of-order arrivals are retained, never panic.
        events.retain(|&t| now.duration_since(t) <= window);
    }
}
