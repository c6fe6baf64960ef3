//! # Audit Sinks
//!
//! The engine emits one [`LogEntry`] per decided request and must never
//! wait for a disk. Sinks therefore accept records through a non-blocking
//! interface: the production sink buffers into a bounded channel drained by
//! a writer task, and when the buffer is full the record is *dropped and
//! counted* rather than stalling a decision.
//!
//! ## Security Notes
//!
//! - A slow or failing disk degrades the audit trail, never availability.
//! - Dropped records are observable through [`AuditSink::dropped`]; silent
//!   loss would hide an attacker filling the disk to blind the operator.
//! - The writer task appends one JSON object per line; partial lines from
//!   a crash are skipped (not fatal) on read-back.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

use crate::entry::LogEntry;

/// Default bound for the in-flight record buffer.
pub const DEFAULT_SINK_CAPACITY: usize = 1024;

/// Destination for decided-request records.
///
/// Implementations must be non-blocking: `record` is called on the decision
/// path and has to return immediately whether or not the record can be
/// persisted.
pub trait AuditSink: Send + Sync {
    /// Accepts one record. Never blocks, never fails outward.
    fn record(&self, entry: LogEntry);

    /// Number of records dropped because the sink could not keep up.
    fn dropped(&self) -> u64 {
        0
    }
}

/// Production sink: bounded channel into a JSONL appender task.
///
/// # Example
///
/// ```rust,no_run
/// use parapet_audit::{AuditSink, JsonlSink, LogEntry};
///
/// # async fn demo() {
/// let (sink, writer) = JsonlSink::spawn("waf_logs.json", 1024);
/// sink.record(LogEntry::new("1.2.3.4", "GET", "http://a/", "None", "ALLOWED", ""));
/// drop(sink); // closes the channel
/// writer.await.unwrap(); // drains remaining records
/// # }
/// ```
pub struct JsonlSink {
    tx: mpsc::Sender<LogEntry>,
    dropped: AtomicU64,
}

impl JsonlSink {
    /// Spawns the writer task and returns the sink handle plus the task's
    /// join handle.
    ///
    /// The file is created if absent and always appended to. Dropping the
    /// sink closes the channel; the writer drains what is buffered and
    /// exits, so awaiting the handle at shutdown flushes the trail.
    #[must_use]
    pub fn spawn(path: impl Into<PathBuf>, capacity: usize) -> (Self, JoinHandle<()>) {
        let path = path.into();
        let (tx, mut rx) = mpsc::channel::<LogEntry>(capacity);

        let handle = tokio::spawn(async move {
            let mut file = match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) => {
                    // Leaving early closes the channel; every subsequent
                    // record lands in the drop counter instead of a void.
                    error!(path = %path.display(), error = %e, "audit log open failed");
                    return;
                }
            };

            while let Some(entry) = rx.recv().await {
                let mut line = match serde_json::to_string(&entry) {
                    Ok(line) => line,
                    Err(e) => {
                        error!(error = %e, "audit record serialization failed");
                        continue;
                    }
                };
                line.push('\n');
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    error!(path = %path.display(), error = %e, "audit log write failed");
                }
            }
        });

        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            handle,
        )
    }
}

impl AuditSink for JsonlSink {
    fn record(&self, entry: LogEntry) {
        // Full buffer and closed channel both count as drops; the decision
        // path never waits either way.
        if self.tx.try_send(entry).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// In-memory sink for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("sink poisoned").clone()
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("sink poisoned").len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn record(&self, entry: LogEntry) {
        self.entries.lock().expect("sink poisoned").push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{ACTION_ALLOWED, ACTION_BLOCKED, ATTACK_NONE};

    fn entry(ip: &str, attack: &str, action: &str) -> LogEntry {
        LogEntry::new(ip, "GET", "http://host.test/x", attack, action, "q=1")
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.record(entry("1.1.1.1", ATTACK_NONE, ACTION_ALLOWED));
        sink.record(entry("2.2.2.2", "SQLi", ACTION_BLOCKED));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ip, "1.1.1.1");
        assert_eq!(entries[1].attack, "SQLi");
        assert_eq!(sink.dropped(), 0);
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waf_logs.json");

        let (sink, writer) = JsonlSink::spawn(&path, 16);
        sink.record(entry("1.1.1.1", ATTACK_NONE, ACTION_ALLOWED));
        sink.record(entry("2.2.2.2", "XSS", ACTION_BLOCKED));
        drop(sink);
        writer.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: LogEntry = serde_json::from_str(lines[0]).unwrap();
        let second: LogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.ip, "1.1.1.1");
        assert_eq!(second.attack, "XSS");
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waf_logs.json");

        for ip in ["1.1.1.1", "2.2.2.2"] {
            let (sink, writer) = JsonlSink::spawn(&path, 16);
            sink.record(entry(ip, ATTACK_NONE, ACTION_ALLOWED));
            drop(sink);
            writer.await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_full_buffer_drops_and_counts() {
        // Single-threaded test runtime: the writer task cannot run until we
        // await, so the channel genuinely fills.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waf_logs.json");

        let (sink, writer) = JsonlSink::spawn(&path, 1);
        for _ in 0..5 {
            sink.record(entry("1.1.1.1", ATTACK_NONE, ACTION_ALLOWED));
        }
        assert_eq!(sink.dropped(), 4);

        drop(sink);
        writer.await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
