//! # Parapet Audit
//!
//! Append-only audit trail for the reverse-proxy firewall: every decided
//! request becomes one JSON line, and the read side turns that trail into
//! dashboard pages, counters, charts, and exports. The protection-toggle
//! file lives here too, since the engine and the operator surface share it
//! through the same storage conventions.
//!
//! ## Threat Model
//!
//! | Threat | Mitigation |
//! |--------|------------|
//! | Slow disk stalls request decisions | Bounded channel, records dropped and counted, never awaited on the hot path |
//! | Attacker floods to blind the trail | Drop counter exposed through [`AuditSink::dropped`] |
//! | Oversized payloads bloat the trail | Payloads excerpted to [`PAYLOAD_EXCERPT_CHARS`] characters before logging |
//! | Corrupt lines from crashes or edits | Readers skip unparseable lines instead of failing the query |
//! | Unbounded trail growth on read | Queries consider at most the last [`DEFAULT_TAIL_CAP`] lines |
//! | Corrupt toggle file disables protection | Load falls back to fail-closed defaults (everything on) |
//!
//! ## Architecture
//!
//! ```text
//!    engine decision            operator surface
//!          |                          |
//!          v                          v
//!    +------------+            +------------+
//!    | AuditSink  |            | ConfigStore|
//!    | (JsonlSink)|            | load/apply |
//!    +-----+------+            +-----+------+
//!          | bounded mpsc            |
//!          v                         v
//!    waf_logs.json  ----->  waf_config.json
//!          |
//!          v
//!    read_tail / paginate / stats / threat_map / timeline / exports
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use parapet_audit::{paginate, stats, LogEntry, MemorySink, AuditSink, PAGE_SIZE};
//!
//! let sink = MemorySink::new();
//! sink.record(LogEntry::new(
//!     "203.0.113.7", "GET", "http://host.test/?q=%27%20or%20%271%27=%271",
//!     "SQLi", "BLOCKED", "q=' or '1'='1",
//! ));
//!
//! let entries = sink.entries();
//! let page = paginate(&entries, 1, PAGE_SIZE);
//! assert_eq!(page.total, 1);
//! assert_eq!(stats(&entries).sqli, 1);
//! ```
//!
//! ## Security Notes
//!
//! - Trail entries carry attacker-controlled strings. Exports quote them
//!   (JSON escaping, RFC 4180 CSV quoting) so a crafted payload cannot
//!   smuggle extra rows into an export.
//! - Log and toggle failures degrade observability only. Nothing in this
//!   crate can turn an engine block into an allow or vice versa.
//!
//! ## References
//!
//! - JSON Lines: <https://jsonlines.org/>
//! - RFC 4180: Common Format and MIME Type for CSV Files

pub mod entry;
pub mod error;
pub mod export;
pub mod query;
pub mod sink;
pub mod store;

pub use entry::{
    LogEntry, ACTION_ALLOWED, ACTION_BLOCKED, ATTACK_NONE, PAYLOAD_EXCERPT_CHARS,
};
pub use error::{AuditError, Result};
pub use export::{to_csv, to_json};
pub use query::{
    paginate, read_tail, stats, threat_map, timeline, LogStats, Page, Timeline, TimelineRange,
    DEFAULT_TAIL_CAP, PAGE_SIZE,
};
pub use sink::{AuditSink, JsonlSink, MemorySink, DEFAULT_SINK_CAPACITY};
pub use store::{ConfigStore, FeatureToggles, ToggleUpdate};
