//! Error types for the timing store.
//!
//! Only unreadable storage is a hard error. Malformed or wrong-version
//! content never fails — the store degrades to empty data instead.

use thiserror::Error;

/// Result type alias for timing store operations.
pub type TimingResult<T> = Result<T, TimingError>;

/// Errors that can occur while persisting the timing store.
#[derive(Debug, Error)]
pub enum TimingError {
    #[error("failed to read timing store: {0}")]
    Read(String),

    #[error("failed to write timing store: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}
