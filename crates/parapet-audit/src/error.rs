//! Error types for the audit trail.

use thiserror::Error;

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Errors that can occur reading or writing audit state.
///
/// # Security Notes
///
/// None of these errors may propagate into the decision path: sink writes
/// are fire-and-forget with a drop counter, and the toggle store falls back
/// to defaults. They surface only through the query/export/store APIs used
/// by operator tooling.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Filesystem access failed.
    #[error("audit I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A record or config document could not be encoded or parsed.
    #[error("audit JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
