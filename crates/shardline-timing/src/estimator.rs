//! Best-guess durations for units with incomplete history.
//!
//! A unit with a direct record uses its smoothed duration. Anything else
//! walks a fallback chain — same-group mean, then global mean, then a
//! fixed default — and is flagged `estimated`. Absence of data is
//! expected here, never an error.

use shardline_core::boundary::DiscoveredUnit;
use shardline_core::{Unit, UnitId};

use crate::store::TimingStore;

/// Assumed duration when the store holds no usable history at all.
pub const DEFAULT_DURATION_MS: u64 = 30_000;

/// An estimator answer: the duration to schedule with, and whether it
/// was guessed rather than measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub duration_ms: u64,
    pub estimated: bool,
}

/// Estimate the duration of one unit. Pure function of its inputs.
pub fn estimate(id: &UnitId, store: &TimingStore) -> Estimate {
    if let Some(record) = store.get(&id.to_wire()) {
        return Estimate {
            duration_ms: record.duration,
            estimated: false,
        };
    }

    // Unseen unit: its group is still known structurally, so sibling
    // records are the best signal available.
    let group_mean = rounded_mean(
        store
            .records()
            .values()
            .filter(|r| r.group == id.group())
            .map(|r| r.duration),
    );
    if let Some(duration_ms) = group_mean {
        return Estimate {
            duration_ms,
            estimated: true,
        };
    }

    let global_mean = rounded_mean(store.records().values().map(|r| r.duration));
    if let Some(duration_ms) = global_mean {
        return Estimate {
            duration_ms,
            estimated: true,
        };
    }

    Estimate {
        duration_ms: DEFAULT_DURATION_MS,
        estimated: true,
    }
}

/// Annotate a discovery list into schedulable units.
pub fn annotate(discovered: &[DiscoveredUnit], store: &TimingStore) -> Vec<Unit> {
    discovered
        .iter()
        .map(|d| {
            let id = d.unit_id();
            let est = estimate(&id, store);
            Unit::new(id, est.duration_ms, est.estimated)
        })
        .collect()
}

fn rounded_mean(durations: impl Iterator<Item = u64>) -> Option<u64> {
    let mut sum = 0u64;
    let mut count = 0u64;
    for d in durations {
        sum += d;
        count += 1;
    }
    (count > 0).then(|| (sum as f64 / count as f64).round() as u64)
}
