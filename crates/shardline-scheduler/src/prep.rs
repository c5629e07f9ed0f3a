//! Shared bookkeeping for the fallback heuristic and the optimal search.
//!
//! Units are sorted once — descending by duration, ties by group so
//! same-group units are adjacent — and groups are interned to indices so
//! the hot paths work on vectors instead of string maps.

use std::collections::HashMap;

use shardline_core::Unit;

use crate::plan::{Assignment, LaneAssignment};

/// One sorted unit, referencing back into the caller's slice.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SortedUnit {
    pub source_index: usize,
    /// Interned group index into `Prepared::group_total`.
    pub group: usize,
    pub duration_ms: u64,
}

/// Per-invocation scheduling input: sorted units, group totals, and the
/// penalty scalar. Immutable during the search.
pub(crate) struct Prepared<'a> {
    pub source: &'a [Unit],
    pub units: Vec<SortedUnit>,
    /// Total unit count per interned group.
    pub group_total: Vec<u32>,
    pub penalty_ms: u64,
    /// `suffix_real[d]` = sum of real durations of `units[d..]`.
    pub suffix_real: Vec<u64>,
}

impl<'a> Prepared<'a> {
    pub(crate) fn new(source: &'a [Unit], penalty_ms: u64) -> Self {
        let mut order: Vec<usize> = (0..source.len()).collect();
        order.sort_by(|&a, &b| {
            source[b]
                .duration_ms
                .cmp(&source[a].duration_ms)
                .then_with(|| source[a].group().cmp(source[b].group()))
                .then_with(|| source[a].id.cmp(&source[b].id))
        });

        let mut group_index: HashMap<&str, usize> = HashMap::new();
        let mut group_total: Vec<u32> = Vec::new();
        let units: Vec<SortedUnit> = order
            .into_iter()
            .map(|source_index| {
                let unit = &source[source_index];
                let group = *group_index.entry(unit.group()).or_insert_with(|| {
                    group_total.push(0);
                    group_total.len() - 1
                });
                group_total[group] += 1;
                SortedUnit {
                    source_index,
                    group,
                    duration_ms: unit.duration_ms,
                }
            })
            .collect();

        let mut suffix_real = vec![0u64; units.len() + 1];
        for i in (0..units.len()).rev() {
            suffix_real[i] = suffix_real[i + 1] + units[i].duration_ms;
        }

        Self {
            source,
            units,
            group_total,
            penalty_ms,
            suffix_real,
        }
    }

    pub(crate) fn group_count(&self) -> usize {
        self.group_total.len()
    }
}

/// Penalty for the next placement of a group, scaled by the fraction of
/// its units still unplaced, so the last unit of a group costs little.
pub(crate) fn amortized_penalty(penalty_ms: u64, remaining: u32, total: u32) -> u64 {
    (penalty_ms as f64 * f64::from(remaining) / f64::from(total)).round() as u64
}

/// A complete partition in sorted-unit space, plus the loads needed to
/// compare and emit it.
#[derive(Debug, Clone)]
pub(crate) struct Solution {
    /// Sorted-unit index → lane index (0-based).
    pub lane_of_unit: Vec<usize>,
    /// Real (unpenalized) load per lane.
    pub real_loads: Vec<u64>,
    /// Penalized makespan — what the search minimizes.
    pub effective_makespan: u64,
}

impl Solution {
    /// Expand into the caller-facing contract. `is_optimal` is left false
    /// for the orchestrator to set.
    pub(crate) fn into_assignment(self, prep: &Prepared<'_>, lane_count: usize) -> Assignment {
        let mut lanes: Vec<LaneAssignment> = (1..=lane_count)
            .map(|index| LaneAssignment {
                index,
                unit_ids: Vec::new(),
                expected_duration_ms: 0,
            })
            .collect();

        for (sorted_index, &lane) in self.lane_of_unit.iter().enumerate() {
            let unit = &prep.source[prep.units[sorted_index].source_index];
            lanes[lane].unit_ids.push(unit.id.to_wire());
            lanes[lane].expected_duration_ms += unit.duration_ms;
        }

        let makespan_ms = lanes
            .iter()
            .map(|l| l.expected_duration_ms)
            .max()
            .unwrap_or(0);

        Assignment {
            lanes,
            makespan_ms,
            is_optimal: false,
        }
    }
}
