//! Shardline partition scheduler — lane assignment minimizing makespan.
//!
//! Consumes weighted units plus an affinity penalty and produces one
//! lane assignment per invocation. It does NOT execute units or talk to
//! the timing store (that's `shardline-timing`); it only partitions.
//!
//! # Components
//!
//! - **`assign`** — entry point, edge cases, and search orchestration
//! - **`plan`** — the output contract (`Assignment`, `LaneAssignment`)
//! - internal: LPT fallback heuristic and the branch-and-bound search

pub mod assign;
pub mod error;
pub mod plan;

mod lpt;
mod prep;
mod search;

pub use assign::{assign, MAX_SEARCH_UNITS};
pub use error::{ScheduleError, ScheduleResult};
pub use plan::{Assignment, LaneAssignment};
