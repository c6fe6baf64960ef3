//! # Parapet Core
//!
//! Request decision engine for the Parapet web application firewall.
//! Orchestrates signature scoring, sliding-window tracking, and the ban
//! list behind a single `decide` call.
//!
//! ## Threat Coverage
//!
//! Parapet provides layered defense at the reverse-proxy boundary:
//!
//! | Layer | Component | Threats Blocked |
//! |-------|-----------|-----------------|
//! | Payload | Signature scorer | SQL injection, cross-site scripting |
//! | Volume | Rate tracker | Floods, scraping bursts |
//! | Credentials | Brute-force tracker | Login stuffing, password spraying |
//! | Repeat offense | Ban list | Return traffic from tripped sources |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PARAPET CORE                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │   InboundRequest → │     Parapet     │ → Verdict                │
//! │                    │     engine      │                          │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │  Signature  │    │   Window    │    │  Ban list   │          │
//! │  │   scorer    │    │  trackers   │    │  + toggles  │          │
//! │  └─────────────┘    └─────────────┘    └─────────────┘          │
//! │                             │                                   │
//! │                             ▼                                   │
//! │                      audit sink (JSONL)                         │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parapet_core::{InboundRequest, Parapet, ParapetConfig, Verdict};
//!
//! let engine = Parapet::new(ParapetConfig::default(), sink)?;
//!
//! match engine.decide(&request) {
//!     Verdict::Allow => forward(request),
//!     Verdict::Block { reason } => respond_403(reason.body()),
//! }
//! ```
//!
//! ## Security Notes
//!
//! - Checks run in a fixed order: trust → bypasses → ban → rate → brute
//!   force → payload; the first decisive check wins
//! - The engine fails open: an internal error allows the request and
//!   leaves an `EngineError` marker in the audit trail
//! - Blocking is toggle-gated per protection; scoring always runs
//! - Every decision except the silent bypasses produces one audit entry
//!
//! ## References
//!
//! - OWASP Top 10 2021, A03 Injection:
//!   <https://owasp.org/Top10/A03_2021-Injection/>
//! - OWASP Automated Threats Handbook (OAT-004 Fingerprinting, OAT-007
//!   Credential Cracking)

mod config;
mod engine;
mod error;
mod gate;
mod request;
mod verdict;

pub use config::{
    AccessConfig, BruteForceConfig, DetectionConfig, ParapetConfig, RateLimitConfig,
};
pub use engine::{EngineStatus, Parapet, ATTACK_ENGINE_ERROR};
pub use error::CoreError;
pub use gate::ConfigGate;
pub use request::{host_of, path_of, InboundRequest};
pub use verdict::{BlockReason, Verdict};

// Re-export component types for convenience
pub use parapet_audit::{
    AuditSink, ConfigStore, FeatureToggles, JsonlSink, LogEntry, MemorySink, ToggleUpdate,
};
pub use parapet_signatures::{AttackCategory, ScoreResult, SignatureScorer};
pub use parapet_tracker::{BanList, SlidingWindowTracker, TrackerConfig, WindowStatus};

/// Core result type for engine operations.
pub type Result<T> = std::result::Result<T, CoreError>;
