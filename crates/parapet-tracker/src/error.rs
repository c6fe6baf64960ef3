//! Error types for the tracking module.
//!
//! Construction-time validation only: the hot-path operations
//! (`record_and_check`, `is_banned`) never fail.

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur while building tracking state.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Window duration of zero would make every event age out instantly,
    /// disabling the check while appearing configured.
    #[error("window duration must be non-zero")]
    ZeroWindow,

    /// Ban duration of zero would make every ban expire on insertion,
    /// disabling escalation while appearing configured.
    #[error("ban duration must be non-zero")]
    ZeroBanDuration,
}
