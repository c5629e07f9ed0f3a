//! Entry point — edge cases, fallback seeding, and search orchestration.

use std::time::{Duration, Instant};

use tracing::debug;

use shardline_core::Unit;

use crate::error::{ScheduleError, ScheduleResult};
use crate::plan::{Assignment, LaneAssignment};
use crate::prep::Prepared;
use crate::search::SearchOutcome;
use crate::{lpt, search};

/// Above this many units the optimal search is skipped outright — the
/// fallback heuristic's answer is returned as-is.
pub const MAX_SEARCH_UNITS: usize = 50;

/// Partition `units` across `lane_count` lanes, minimizing the maximum
/// lane duration.
///
/// The fallback heuristic always produces a complete assignment first;
/// the branch-and-bound search then gets `timeout` of wall clock to prove
/// it optimal or beat it. `is_optimal` reports whether the proof
/// finished. Per-lane expected durations and the makespan are real
/// (unpenalized) sums even though the search optimizes penalized loads.
pub fn assign(
    units: &[Unit],
    lane_count: usize,
    timeout: Duration,
    penalty_ms: u64,
) -> ScheduleResult<Assignment> {
    if lane_count == 0 {
        return Err(ScheduleError::InvalidLaneCount(lane_count));
    }

    if units.is_empty() {
        return Ok(Assignment {
            lanes: empty_lanes(lane_count),
            makespan_ms: 0,
            is_optimal: true,
        });
    }

    if lane_count >= units.len() {
        return Ok(one_unit_per_lane(units, lane_count));
    }

    let prep = Prepared::new(units, penalty_ms);
    let mut best = lpt::run(&prep, lane_count);

    let mut is_optimal = false;
    if units.len() <= MAX_SEARCH_UNITS {
        let deadline = Instant::now() + timeout;
        let outcome = search::run(&prep, lane_count, deadline, &mut best);
        is_optimal = outcome == SearchOutcome::Completed;
    } else {
        debug!(
            units = units.len(),
            limit = MAX_SEARCH_UNITS,
            "input too large for optimal search; using fallback"
        );
    }

    let mut assignment = best.into_assignment(&prep, lane_count);
    assignment.is_optimal = is_optimal;
    debug!(
        units = units.len(),
        lanes = lane_count,
        makespan_ms = assignment.makespan_ms,
        is_optimal,
        "assignment computed"
    );
    Ok(assignment)
}

fn empty_lanes(lane_count: usize) -> Vec<LaneAssignment> {
    (1..=lane_count)
        .map(|index| LaneAssignment {
            index,
            unit_ids: Vec::new(),
            expected_duration_ms: 0,
        })
        .collect()
}

/// More lanes than units: each unit gets its own lane, largest first, and
/// the rest stay empty. Trivially optimal.
fn one_unit_per_lane(units: &[Unit], lane_count: usize) -> Assignment {
    let mut order: Vec<&Unit> = units.iter().collect();
    order.sort_by(|a, b| {
        b.duration_ms
            .cmp(&a.duration_ms)
            .then_with(|| a.group().cmp(b.group()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut lanes = empty_lanes(lane_count);
    for (lane, unit) in lanes.iter_mut().zip(&order) {
        lane.unit_ids.push(unit.id.to_wire());
        lane.expected_duration_ms = unit.duration_ms;
    }

    let makespan_ms = order.first().map_or(0, |u| u.duration_ms);
    Assignment {
        lanes,
        makespan_ms,
        is_optimal: true,
    }
}
