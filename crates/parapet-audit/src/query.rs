//! # Trail Queries
//!
//! Read-side views over the JSONL trail: bounded tail loading, newest-first
//! pagination, aggregate counters, per-source threat totals, and bucketed
//! timelines for charting.
//!
//! Queries tolerate a dirty trail. Corrupt lines (partial writes, manual
//! edits) are skipped, and a missing file reads as an empty trail rather
//! than an error, so a fresh deployment renders an empty dashboard instead
//! of a failure page.

use std::collections::{BTreeMap, VecDeque};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::entry::LogEntry;
use crate::error::Result;

/// Upper bound on entries loaded from the trail per query.
pub const DEFAULT_TAIL_CAP: usize = 10_000;

/// Entries per dashboard page.
pub const PAGE_SIZE: usize = 50;

/// Loads at most the last `cap` well-formed entries from a JSONL trail.
///
/// Only the final `cap` *lines* are considered, so an unbounded trail costs
/// a bounded amount of memory per query. Lines that fail to parse are
/// dropped silently.
///
/// # Arguments
///
/// * `path` - JSONL trail location
/// * `cap` - maximum number of trailing lines to consider
///
/// # Errors
///
/// Returns an error only for I/O failures other than the file being
/// absent; a missing trail yields an empty vector.
pub fn read_tail(path: impl AsRef<Path>, cap: usize) -> Result<Vec<LogEntry>> {
    let file = match std::fs::File::open(path.as_ref()) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut lines: VecDeque<String> = VecDeque::new();
    for line in BufReader::new(file).lines() {
        lines.push_back(line?);
        if lines.len() > cap {
            lines.pop_front();
        }
    }

    Ok(lines
        .iter()
        .filter_map(|line| serde_json::from_str::<LogEntry>(line).ok())
        .collect())
}

/// One dashboard page, newest entries first.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Entries on this page, newest first.
    pub entries: Vec<LogEntry>,
    /// 1-based page number actually served.
    pub page: usize,
    /// Total entries across all pages.
    pub total: usize,
    /// Total pages, at least 1.
    pub total_pages: usize,
}

/// Slices a trail into a newest-first page.
///
/// `entries` is taken in trail order (oldest first) and reversed for
/// display. Page numbers are 1-based; a request below 1 is clamped to 1
/// and a request past the end serves an empty page with honest totals.
#[must_use]
pub fn paginate(entries: &[LogEntry], page: usize, page_size: usize) -> Page {
    let page = page.max(1);
    let total = entries.len();
    let total_pages = total.div_ceil(page_size).max(1);

    let start = (page - 1).saturating_mul(page_size);
    let slice: Vec<LogEntry> = entries
        .iter()
        .rev()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        entries: slice,
        page,
        total,
        total_pages,
    }
}

/// Aggregate counters over a trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct LogStats {
    /// All entries seen.
    pub total: usize,
    /// Entries with a BLOCKED action.
    pub blocked: usize,
    /// Entries with an ALLOWED action.
    pub allowed: usize,
    /// Cross-site scripting detections.
    pub xss: usize,
    /// SQL injection detections.
    pub sqli: usize,
    /// Brute-force lockouts.
    pub bruteforce: usize,
    /// Rate-limit trips.
    pub ratelimit: usize,
}

/// Tallies actions and attack classes over the whole slice.
///
/// Attack counters include every entry carrying the class marker, blocked
/// or not, so detection-only deployments (toggles off) still chart what
/// they saw.
#[must_use]
pub fn stats(entries: &[LogEntry]) -> LogStats {
    let mut out = LogStats {
        total: entries.len(),
        ..LogStats::default()
    };
    for entry in entries {
        if entry.is_blocked() {
            out.blocked += 1;
        } else {
            out.allowed += 1;
        }
        match entry.attack.as_str() {
            "XSS" => out.xss += 1,
            "SQLi" => out.sqli += 1,
            "BruteForce" => out.bruteforce += 1,
            "RateLimit" => out.ratelimit += 1,
            _ => {}
        }
    }
    out
}

/// Blocked-request totals per source address, ordered by address.
#[must_use]
pub fn threat_map(entries: &[LogEntry]) -> BTreeMap<String, usize> {
    let mut map = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.is_blocked()) {
        *map.entry(entry.ip.clone()).or_insert(0) += 1;
    }
    map
}

/// Charting window for [`timeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineRange {
    /// Since midnight UTC.
    Today,
    /// Trailing 24 hours.
    Last24h,
    /// Trailing 7 days.
    Last7d,
}

impl TimelineRange {
    /// Start of the window relative to `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            // Midnight of the current UTC day. The arguments come from
            // `now` itself, so the construction cannot be out of range.
            Self::Today => Utc
                .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
                .single()
                .unwrap_or(now),
            Self::Last24h => now - Duration::hours(24),
            Self::Last7d => now - Duration::days(7),
        }
    }
}

impl FromStr for TimelineRange {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "24h" => Ok(Self::Last24h),
            "7d" => Ok(Self::Last7d),
            _ => Err(()),
        }
    }
}

/// Minute-bucketed activity series for one window.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Timeline {
    /// Bucket labels in `HH:MM` form, ascending.
    pub labels: Vec<String>,
    /// Entries per bucket, aligned with `labels`.
    pub values: Vec<usize>,
    /// Entries inside the window.
    pub received: usize,
    /// Blocked entries inside the window.
    pub blocked: usize,
}

/// Buckets trail entries by minute of day within the chosen window.
///
/// Entries without a parseable timestamp are excluded. Buckets are keyed
/// `HH:MM` in every range, so a 7-day window folds days together; labels
/// sort ascending.
#[must_use]
pub fn timeline(entries: &[LogEntry], range: TimelineRange, now: DateTime<Utc>) -> Timeline {
    let start = range.start(now);
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    let mut received = 0;
    let mut blocked = 0;

    for entry in entries {
        let Some(at) = entry.timestamp() else {
            continue;
        };
        if at < start || at > now {
            continue;
        }
        received += 1;
        if entry.is_blocked() {
            blocked += 1;
        }
        let label = format!("{:02}:{:02}", at.hour(), at.minute());
        *buckets.entry(label).or_insert(0) += 1;
    }

    let mut timeline = Timeline {
        received,
        blocked,
        ..Timeline::default()
    };
    for (label, count) in buckets {
        timeline.labels.push(label);
        timeline.values.push(count);
    }
    timeline
}
