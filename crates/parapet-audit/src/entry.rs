//! # Audit Log Entry
//!
//! One decided request projects to exactly one flat record. The schema is
//! the interchange contract between the engine, the on-disk JSONL log, and
//! every aggregation view, so it stays deliberately flat: seven string
//! fields, no nesting, write-once.
//!
//! ## Field Reference
//!
//! | Field | Content |
//! |-------|---------|
//! | `time` | ISO-8601 UTC, microsecond precision, no zone suffix |
//! | `ip` | Client address the decision was keyed on |
//! | `method` | HTTP method as received |
//! | `url` | Full target URL |
//! | `attack` | Marker: `SQLi`, `XSS`, `RateLimit`, `BruteForce`, `IPBlocked`, `EngineError`, or `None` |
//! | `action` | `BLOCKED` or `ALLOWED` |
//! | `payload` | Normalized payload excerpt, at most 200 characters |

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action marker for a blocked request.
pub const ACTION_BLOCKED: &str = "BLOCKED";

/// Action marker for an allowed request.
pub const ACTION_ALLOWED: &str = "ALLOWED";

/// Attack marker for decisions with no classified attack.
pub const ATTACK_NONE: &str = "None";

/// Longest payload excerpt stored per record.
pub const PAYLOAD_EXCERPT_CHARS: usize = 200;

/// Timestamp layout written into records.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One audit record, serialized as a single JSON object per log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 UTC timestamp.
    pub time: String,
    /// Client address.
    pub ip: String,
    /// HTTP method.
    pub method: String,
    /// Full target URL.
    pub url: String,
    /// Attack marker (see module docs).
    pub attack: String,
    /// `BLOCKED` or `ALLOWED`.
    pub action: String,
    /// Payload excerpt, truncated to [`PAYLOAD_EXCERPT_CHARS`].
    pub payload: String,
}

impl LogEntry {
    /// Builds a record stamped with the current UTC time.
    #[must_use]
    pub fn new(
        ip: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
        attack: impl Into<String>,
        action: impl Into<String>,
        payload: &str,
    ) -> Self {
        Self::at(Utc::now(), ip, method, url, attack, action, payload)
    }

    /// Builds a record with an explicit timestamp.
    ///
    /// Aggregation tests use this to place records at known instants.
    #[must_use]
    pub fn at(
        time: DateTime<Utc>,
        ip: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
        attack: impl Into<String>,
        action: impl Into<String>,
        payload: &str,
    ) -> Self {
        Self {
            time: time.format(TIME_FORMAT).to_string(),
            ip: ip.into(),
            method: method.into(),
            url: url.into(),
            attack: attack.into(),
            action: action.into(),
            payload: excerpt(payload),
        }
    }

    /// Whether this record describes a blocked request.
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.action == ACTION_BLOCKED
    }

    /// Parses this record's timestamp back into a UTC instant.
    ///
    /// Tolerates a trailing `Z` or `+00:00` so exported and re-imported
    /// records stay readable. Returns `None` for unparseable stamps.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.time)
    }
}

/// Parses an ISO-8601 UTC stamp as written by [`LogEntry`].
#[must_use]
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s
        .strip_suffix('Z')
        .or_else(|| s.strip_suffix("+00:00"))
        .unwrap_or(s);
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Truncates a payload to the stored excerpt length, by characters.
fn excerpt(payload: &str) -> String {
    if payload.len() <= PAYLOAD_EXCERPT_CHARS {
        return payload.to_string();
    }
    payload.chars().take(PAYLOAD_EXCERPT_CHARS).collect()
}
