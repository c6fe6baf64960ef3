//! # Ban List
//!
//! Temporary per-address blocks with lazy expiry. A ban is an escalation
//! decision made once (rate or brute-force threshold tripped) and enforced
//! cheaply on every subsequent request until it expires.
//!
//! ## Semantics
//!
//! - `ban` sets expiry to `now + duration`, overwriting any existing entry.
//!   Repeat offenses slide the expiry forward; they never stack.
//! - `is_banned` treats an entry with expiry `<= now` as absent and removes
//!   it on touch (lazy expiry). [`BanList::sweep`] removes expired entries
//!   in bulk for addresses that never return.
//! - Trusted addresses are exempt: `ban` on a trusted key is a no-op, so a
//!   trusted client can trip every threshold and still pass.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};

/// Per-address temporary block registry.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use parapet_tracker::BanList;
///
/// let bans = BanList::new(Duration::from_secs(120), ["127.0.0.1".to_string()]).unwrap();
/// let t0 = Instant::now();
///
/// bans.ban("203.0.113.9", t0);
/// assert!(bans.is_banned("203.0.113.9", t0 + Duration::from_secs(119)));
/// assert!(!bans.is_banned("203.0.113.9", t0 + Duration::from_secs(121)));
///
/// // Trusted addresses cannot be banned.
/// bans.ban("127.0.0.1", t0);
/// assert!(!bans.is_banned("127.0.0.1", t0));
/// ```
#[derive(Debug)]
pub struct BanList {
    duration: Duration,
    trusted: HashSet<String>,
    bans: DashMap<String, Instant>,
}

impl BanList {
    /// Creates a ban list with the given ban duration and trusted set.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::ZeroBanDuration`] for a zero duration.
    pub fn new(duration: Duration, trusted: impl IntoIterator<Item = String>) -> Result<Self> {
        if duration.is_zero() {
            return Err(TrackerError::ZeroBanDuration);
        }
        Ok(Self {
            duration,
            trusted: trusted.into_iter().collect(),
            bans: DashMap::new(),
        })
    }

    /// Bans `key` until `now + duration`, overwriting any existing ban.
    ///
    /// No-op for trusted keys.
    pub fn ban(&self, key: &str, now: Instant) {
        if self.trusted.contains(key) {
            debug!(key, "ban skipped: trusted address");
            return;
        }
        self.bans.insert(key.to_string(), now + self.duration);
        warn!(key, duration_secs = self.duration.as_secs(), "address banned");
    }

    /// Whether `key` is banned at `now`.
    ///
    /// Expired entries read as not-banned and are removed on touch.
    pub fn is_banned(&self, key: &str, now: Instant) -> bool {
        match self.bans.get(key).map(|expiry| *expiry) {
            Some(expiry) if expiry > now => true,
            Some(_) => {
                // Lazy expiry. The predicate re-checks under the entry lock
                // so a concurrent re-ban survives.
                self.bans.remove_if(key, |_, expiry| *expiry <= now);
                false
            }
            None => false,
        }
    }

    /// Whether `key` belongs to the trusted exempt set.
    #[inline]
    #[must_use]
    pub fn is_trusted(&self, key: &str) -> bool {
        self.trusted.contains(key)
    }

    /// The expiry instant for `key`, if an entry exists (expired or not).
    #[must_use]
    pub fn expiry_of(&self, key: &str) -> Option<Instant> {
        self.bans.get(key).map(|expiry| *expiry)
    }

    /// Removes every entry expired at `now`. Returns the number removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.bans.len();
        self.bans.retain(|_, expiry| *expiry > now);
        let removed = before.saturating_sub(self.bans.len());
        if removed > 0 {
            debug!(removed, "expired bans swept");
        }
        removed
    }

    /// Number of entries currently held, including any awaiting lazy expiry.
    #[must_use]
    pub fn active_bans(&self) -> usize {
        self.bans.len()
    }

    /// The configured ban duration.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}
