//! Longest-processing-time fallback heuristic.
//!
//! Greedy pass over the sorted units: each goes to the lane with the
//! lowest effective load, where effective load charges the amortized
//! affinity penalty when the lane does not hold the unit's group yet.
//! Ties prefer a lane that already holds the group. The result seeds the
//! branch-and-bound upper bound and is the answer whenever the search
//! cannot finish in time.

use tracing::debug;

use crate::prep::{Prepared, Solution, amortized_penalty};

pub(crate) fn run(prep: &Prepared<'_>, lane_count: usize) -> Solution {
    let groups = prep.group_count();
    let mut real = vec![0u64; lane_count];
    let mut effective = vec![0u64; lane_count];
    let mut has_group = vec![vec![false; groups]; lane_count];
    let mut remaining = prep.group_total.clone();
    let mut lane_of_unit = vec![0usize; prep.units.len()];

    for (sorted_index, unit) in prep.units.iter().enumerate() {
        let g = unit.group;
        let penalty = amortized_penalty(prep.penalty_ms, remaining[g], prep.group_total[g]);

        let mut best_lane = 0usize;
        let mut best_effective = u64::MAX;
        let mut best_holds_group = false;
        for lane in 0..lane_count {
            let holds_group = has_group[lane][g];
            let extra = if holds_group { 0 } else { penalty };
            let candidate = effective[lane] + unit.duration_ms + extra;
            let better = candidate < best_effective
                || (candidate == best_effective && holds_group && !best_holds_group);
            if better {
                best_lane = lane;
                best_effective = candidate;
                best_holds_group = holds_group;
            }
        }

        real[best_lane] += unit.duration_ms;
        effective[best_lane] = best_effective;
        has_group[best_lane][g] = true;
        remaining[g] -= 1;
        lane_of_unit[sorted_index] = best_lane;
    }

    let effective_makespan = effective.iter().copied().max().unwrap_or(0);
    debug!(
        units = prep.units.len(),
        lanes = lane_count,
        effective_makespan,
        "fallback heuristic complete"
    );

    Solution {
        lane_of_unit,
        real_loads: real,
        effective_makespan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardline_core::{Unit, UnitId};

    fn unit(id: &str, duration_ms: u64) -> Unit {
        Unit::new(UnitId::parse(id), duration_ms, false)
    }

    #[test]
    fn balances_equal_units_across_lanes() {
        let units = vec![
            unit("a.ts::1", 1000),
            unit("b.ts::1", 1000),
            unit("c.ts::1", 1000),
            unit("d.ts::1", 1000),
        ];
        let prep = Prepared::new(&units, 0);
        let solution = run(&prep, 2);

        assert_eq!(solution.real_loads, vec![2000, 2000]);
        assert_eq!(solution.effective_makespan, 2000);
    }

    #[test]
    fn places_largest_units_first() {
        let units = vec![
            unit("a.ts::big", 800),
            unit("b.ts::1", 300),
            unit("c.ts::1", 300),
            unit("d.ts::1", 200),
        ];
        let prep = Prepared::new(&units, 0);
        let solution = run(&prep, 2);

        // 800 alone vs 300+300+200.
        let mut loads = solution.real_loads.clone();
        loads.sort_unstable();
        assert_eq!(loads, vec![800, 800]);
    }

    #[test]
    fn tie_prefers_lane_already_holding_group() {
        // Two lanes with identical loads after the first two placements;
        // the third unit shares a group with the first and must join it.
        let units = vec![
            unit("a.ts::1", 500),
            unit("b.ts::1", 500),
            unit("a.ts::2", 100),
        ];
        let prep = Prepared::new(&units, 0);
        let solution = run(&prep, 2);

        let lane_of = |needle: &str| {
            let sorted_index = prep
                .units
                .iter()
                .position(|u| units[u.source_index].id.to_wire() == needle)
                .unwrap();
            solution.lane_of_unit[sorted_index]
        };
        assert_eq!(lane_of("a.ts::1"), lane_of("a.ts::2"));
    }

    #[test]
    fn effective_makespan_includes_penalties() {
        let units = vec![unit("a.ts::1", 100), unit("b.ts::1", 100)];
        let prep = Prepared::new(&units, 1000);
        let solution = run(&prep, 2);

        // Each lane pays its group's full penalty (remaining == total).
        assert_eq!(solution.effective_makespan, 1100);
        assert_eq!(solution.real_loads.iter().max(), Some(&100));
    }
}
