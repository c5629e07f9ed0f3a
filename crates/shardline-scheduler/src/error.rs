//! Error types for the partition scheduler.

use thiserror::Error;

/// Result type alias for scheduler operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors that can occur while computing an assignment.
///
/// Search exhaustion is deliberately not here — running out of time is
/// reported via `Assignment::is_optimal`, with the fallback heuristic's
/// complete answer always available.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("lane count must be positive, got {0}")]
    InvalidLaneCount(usize),
}
