//! The assignment contract exposed to execution dispatch and reporting.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Units assigned to one lane.
///
/// `expected_duration_ms` is the sum of the real unit durations — the
/// affinity penalty is an internal search cost and never surfaces here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneAssignment {
    /// 1-based lane index, contiguous across the assignment.
    pub index: usize,
    /// Wire identifiers of the units on this lane (order irrelevant).
    pub unit_ids: Vec<String>,
    pub expected_duration_ms: u64,
}

/// A complete partition of the input units across lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Exactly one entry per lane, empty lanes included.
    pub lanes: Vec<LaneAssignment>,
    /// Maximum real (unpenalized) lane duration.
    pub makespan_ms: u64,
    /// True when the search proved no better partition exists; false when
    /// the fallback heuristic's answer stands.
    pub is_optimal: bool,
}

impl Assignment {
    /// Total number of units across all lanes.
    pub fn unit_count(&self) -> usize {
        self.lanes.iter().map(|l| l.unit_ids.len()).sum()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LaneWire<'a> {
    unit_ids: &'a [String],
    expected_duration_ms: u64,
}

// Serializes to the flat wire object consumers rely on:
// `{lanes: {"<index>": {unitIds, expectedDurationMs}}, makespanMs, isOptimal}`.
impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let lanes: BTreeMap<String, LaneWire<'_>> = self
            .lanes
            .iter()
            .map(|lane| {
                (
                    lane.index.to_string(),
                    LaneWire {
                        unit_ids: &lane.unit_ids,
                        expected_duration_ms: lane.expected_duration_ms,
                    },
                )
            })
            .collect();

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("lanes", &lanes)?;
        map.serialize_entry("makespanMs", &self.makespan_ms)?;
        map.serialize_entry("isOptimal", &self.is_optimal)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_flat_wire_object() {
        let assignment = Assignment {
            lanes: vec![
                LaneAssignment {
                    index: 1,
                    unit_ids: vec!["a.ts::one".to_string()],
                    expected_duration_ms: 1500,
                },
                LaneAssignment {
                    index: 2,
                    unit_ids: vec![],
                    expected_duration_ms: 0,
                },
            ],
            makespan_ms: 1500,
            is_optimal: true,
        };

        let value = serde_json::to_value(&assignment).unwrap();
        assert_eq!(value["lanes"]["1"]["unitIds"][0], "a.ts::one");
        assert_eq!(value["lanes"]["1"]["expectedDurationMs"], 1500);
        assert_eq!(value["lanes"]["2"]["unitIds"].as_array().unwrap().len(), 0);
        assert_eq!(value["makespanMs"], 1500);
        assert_eq!(value["isOptimal"], true);
    }

    #[test]
    fn unit_count_sums_across_lanes() {
        let assignment = Assignment {
            lanes: vec![
                LaneAssignment {
                    index: 1,
                    unit_ids: vec!["a".into(), "b".into()],
                    expected_duration_ms: 2,
                },
                LaneAssignment {
                    index: 2,
                    unit_ids: vec!["c".into()],
                    expected_duration_ms: 1,
                },
            ],
            makespan_ms: 2,
            is_optimal: false,
        };
        assert_eq!(assignment.unit_count(), 3);
    }
}
