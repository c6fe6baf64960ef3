//! # Parapet Tracker - Behavioral State Layer
//!
//! The stateful half of the Parapet decision engine: per-client sliding
//! windows and the temporary ban registry. Where `parapet-signatures` judges
//! one request in isolation, this crate judges a client's *behavior over
//! time*.
//!
//! ## Threat Model
//!
//! | Threat | Signal | Defense |
//! |--------|--------|---------|
//! | Volumetric flood | Requests per 10 s window | Rate tracker + ban |
//! | Credential stuffing | Sensitive-endpoint hits per 30 s | Brute tracker + ban |
//! | Ban evasion by waiting | Expired entries | Lazy expiry, fresh state |
//! | Memory exhaustion via address churn | Idle keys accumulating | Periodic sweep |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 BEHAVIORAL STATE                 │
//! │                                                  │
//! │  ┌────────────────┐      ┌────────────────┐      │
//! │  │  RATE TRACKER  │      │ BRUTE TRACKER  │      │
//! │  │  DashMap<ip,   │      │  DashMap<ip,   │      │
//! │  │   VecDeque>    │      │   VecDeque>    │      │
//! │  │  10s / >50     │      │  30s / >5      │      │
//! │  └───────┬────────┘      └───────┬────────┘      │
//! │          │ exceeded             │ exceeded      │
//! │          ▼                      ▼               │
//! │  ┌──────────────────────────────────────┐        │
//! │  │              BAN LIST                │        │
//! │  │     DashMap<ip, expiry Instant>      │        │
//! │  │     120s, overwrite, lazy expiry     │        │
//! │  └──────────────────────────────────────┘        │
//! │                                                  │
//! │  SWEEPER (periodic): drop empty windows,         │
//! │                      drop expired bans           │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Notes
//!
//! - Same-key operations serialize on the map entry lock: two simultaneous
//!   requests from one address cannot lose an update.
//! - Unrelated keys never contend; one hot attacker cannot slow down
//!   tracking for everyone else.
//! - Trusted addresses are exempt at the ban layer itself, so no caller
//!   ordering mistake can ban the proxy's own traffic.
//!
//! ## Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use parapet_tracker::{BanList, SlidingWindowTracker, TrackerConfig};
//!
//! let rate = SlidingWindowTracker::new(TrackerConfig::new(Duration::from_secs(10), 50)).unwrap();
//! let bans = BanList::new(Duration::from_secs(120), []).unwrap();
//!
//! let now = Instant::now();
//! let status = rate.record_and_check("198.51.100.7", now);
//! if status.exceeded {
//!     bans.ban("198.51.100.7", now);
//! }
//! assert_eq!(status.count, 1);
//! ```

pub mod banlist;
pub mod error;
pub mod sweep;
pub mod window;

pub use banlist::BanList;
pub use error::{Result, TrackerError};
pub use sweep::spawn_sweeper;
pub use window::{SlidingWindowTracker, TrackerConfig, WindowStatus};
