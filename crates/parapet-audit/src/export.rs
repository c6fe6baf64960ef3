//! Trail exports for offline analysis.
//!
//! Two formats: a JSON array mirroring the wire shape of [`LogEntry`], and
//! CSV with a fixed column order for spreadsheet import. Both export the
//! slice as given; callers pick the window (full tail, one page, one
//! source) before exporting.

use crate::entry::LogEntry;
use crate::error::Result;

/// Column order for CSV export.
const CSV_HEADER: &str = "time,ip,method,url,attack,action,payload";

/// Serializes entries as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails, which only happens on
/// formatter I/O problems since [`LogEntry`] is plain data.
pub fn to_json(entries: &[LogEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Renders entries as CSV with a fixed header row.
///
/// An empty slice yields an empty string, no header, so piping an export
/// of a fresh trail produces a zero-byte file instead of a lone header.
#[must_use]
pub fn to_csv(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for entry in entries {
        let fields = [
            &entry.time,
            &entry.ip,
            &entry.method,
            &entry.url,
            &entry.attack,
            &entry.action,
            &entry.payload,
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quotes one CSV field when it contains a delimiter, quote, or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
