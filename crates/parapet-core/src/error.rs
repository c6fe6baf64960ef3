//! Error types for the Parapet engine.

use thiserror::Error;

/// Core error type for engine construction.
///
/// Construction is the only fallible surface. Once built, `decide` is
/// infallible: internal evaluation errors fail open to Allow with an
/// `EngineError` audit marker instead of surfacing here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration rejected before any component was built.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tracker or ban list rejected its settings.
    #[error("tracker error: {0}")]
    Tracker(#[from] parapet_tracker::TrackerError),
}
