//! Affinity penalty derivation.
//!
//! The scheduler charges a penalty whenever it introduces a group to a
//! lane that does not hold it yet. The penalty is the lower quartile of
//! the per-group mean durations in the store: modest relative to typical
//! per-group overhead, so splitting is only paid for when it genuinely
//! improves balance.

use std::collections::HashMap;

use tracing::debug;

use crate::store::TimingStore;

/// Penalty used when the store has no groups to derive one from.
pub const DEFAULT_PENALTY_MS: u64 = 30_000;

/// Derive the affinity penalty from current store contents.
pub fn derive_penalty(store: &TimingStore) -> u64 {
    let mut sums: HashMap<&str, (u64, u64)> = HashMap::new();
    for record in store.records().values() {
        let entry = sums.entry(record.group.as_str()).or_insert((0, 0));
        entry.0 += record.duration;
        entry.1 += 1;
    }

    if sums.is_empty() {
        return DEFAULT_PENALTY_MS;
    }

    let mut means: Vec<f64> = sums
        .values()
        .map(|(sum, count)| *sum as f64 / *count as f64)
        .collect();
    means.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let penalty = percentile(&means, 0.25).round() as u64;
    debug!(groups = means.len(), penalty, "derived affinity penalty");
    penalty
}

/// Percentile with linear interpolation between bracketing order
/// statistics. `sorted` must be non-empty and ascending.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
    }
}
