//! Duration history for the shardline scheduler.
//!
//! This crate owns everything the scheduler learns between runs:
//!
//! - **`store`** — versioned, mergeable, prunable timing document
//!   (exponentially smoothed per-unit durations, persisted as JSON)
//! - **`estimator`** — best-guess duration for units with or without
//!   history, via a group-mean / global-mean / default fallback chain
//! - **`penalty`** — derives the affinity penalty the scheduler charges
//!   for splitting a group across lanes
//!
//! All store updates are functional: `merge` and `prune` return new
//! stores, so callers never share mutable state with the engine.

pub mod error;
pub mod estimator;
pub mod penalty;
pub mod store;

pub use error::{TimingError, TimingResult};
pub use estimator::{Estimate, annotate, estimate, DEFAULT_DURATION_MS};
pub use penalty::{derive_penalty, DEFAULT_PENALTY_MS};
pub use store::{ema, TimingRecord, TimingStore, SCHEMA_VERSION};
