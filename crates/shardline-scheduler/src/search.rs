//! Branch-and-bound search for a provably optimal lane assignment.
//!
//! Depth-first over the sorted units, one lane decision per unit. A
//! branch is abandoned unless its lower bound is strictly below the
//! incumbent (seeded from the LPT fallback). The wall clock is checked
//! cooperatively on every entry; expiry unwinds the whole recursion,
//! restoring the per-group remaining counters on every backtrack path,
//! and leaves the incumbent as the answer.

use std::time::Instant;

use tracing::debug;

use crate::prep::{Prepared, Solution, amortized_penalty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchOutcome {
    /// The whole (pruned) space was explored: the incumbent is optimal.
    Completed,
    /// The deadline expired first: the incumbent is best-so-far only.
    TimedOut,
}

struct SearchState {
    real: Vec<u64>,
    effective: Vec<u64>,
    /// `has_group[lane][group]`.
    has_group: Vec<Vec<bool>>,
    /// Unplaced unit count per group. Saved and restored around every
    /// recursive call, including the timeout unwind.
    remaining: Vec<u32>,
    lane_of_unit: Vec<usize>,
    timed_out: bool,
}

/// Run the search, improving `best` in place when a strictly better
/// complete solution is found.
pub(crate) fn run(
    prep: &Prepared<'_>,
    lane_count: usize,
    deadline: Instant,
    best: &mut Solution,
) -> SearchOutcome {
    let mut state = SearchState {
        real: vec![0; lane_count],
        effective: vec![0; lane_count],
        has_group: vec![vec![false; prep.group_count()]; lane_count],
        remaining: prep.group_total.clone(),
        lane_of_unit: vec![0; prep.units.len()],
        timed_out: false,
    };

    explore(prep, &mut state, 0, best, deadline);

    if state.timed_out {
        debug!("optimal search timed out; keeping best-so-far");
        SearchOutcome::TimedOut
    } else {
        SearchOutcome::Completed
    }
}

fn explore(
    prep: &Prepared<'_>,
    state: &mut SearchState,
    depth: usize,
    best: &mut Solution,
    deadline: Instant,
) {
    if Instant::now() >= deadline {
        state.timed_out = true;
        return;
    }

    if depth == prep.units.len() {
        let effective_makespan = state.effective.iter().copied().max().unwrap_or(0);
        if effective_makespan < best.effective_makespan {
            *best = Solution {
                lane_of_unit: state.lane_of_unit.clone(),
                real_loads: state.real.clone(),
                effective_makespan,
            };
        }
        return;
    }

    if lower_bound(prep, state, depth) >= best.effective_makespan {
        return;
    }

    let unit = prep.units[depth];
    let g = unit.group;
    let penalty = amortized_penalty(prep.penalty_ms, state.remaining[g], prep.group_total[g]);

    // Lanes in ascending effective-load order; symmetric states are
    // explored once. When the penalty is active two lanes are equivalent
    // only if they agree on both load and group membership.
    let mut order: Vec<usize> = (0..state.effective.len()).collect();
    order.sort_by_key(|&lane| state.effective[lane]);

    let mut tried: Vec<(u64, bool)> = Vec::with_capacity(order.len());
    for lane in order {
        let holds_group = state.has_group[lane][g];
        let key = (
            state.effective[lane],
            if prep.penalty_ms > 0 { holds_group } else { false },
        );
        if tried.contains(&key) {
            continue;
        }
        tried.push(key);

        let extra = if holds_group { 0 } else { penalty };

        state.real[lane] += unit.duration_ms;
        state.effective[lane] += unit.duration_ms + extra;
        if !holds_group {
            state.has_group[lane][g] = true;
        }
        state.remaining[g] -= 1;
        state.lane_of_unit[depth] = lane;

        explore(prep, state, depth + 1, best, deadline);

        state.remaining[g] += 1;
        if !holds_group {
            state.has_group[lane][g] = false;
        }
        state.effective[lane] -= unit.duration_ms + extra;
        state.real[lane] -= unit.duration_ms;

        if state.timed_out {
            return;
        }
    }
}

/// Lower bound on the effective makespan reachable from this node.
///
/// Three terms, the max wins: the loaded lanes as they stand, the largest
/// remaining real duration (it must land somewhere whole), and the
/// averaged total — current effective loads plus all remaining real work
/// plus the minimum unavoidable new-group penalty, split evenly.
fn lower_bound(prep: &Prepared<'_>, state: &SearchState, depth: usize) -> u64 {
    let current_max = state.effective.iter().copied().max().unwrap_or(0);
    let largest_remaining = prep.units.get(depth).map_or(0, |u| u.duration_ms);

    // Every group with unplaced units that no lane holds yet must pay at
    // least its next amortized penalty somewhere.
    let mut unavoidable = 0u64;
    if prep.penalty_ms > 0 {
        for g in 0..prep.group_count() {
            if state.remaining[g] == 0 {
                continue;
            }
            let on_some_lane = state.has_group.iter().any(|lane| lane[g]);
            if !on_some_lane {
                unavoidable +=
                    amortized_penalty(prep.penalty_ms, state.remaining[g], prep.group_total[g]);
            }
        }
    }

    let sum_effective: u64 = state.effective.iter().sum();
    let averaged = (sum_effective + prep.suffix_real[depth] + unavoidable)
        .div_ceil(state.effective.len() as u64);

    current_max.max(largest_remaining).max(averaged)
}
