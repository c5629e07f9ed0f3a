//! Wire contracts shared with external collaborators.
//!
//! Discovery and post-run report extraction live outside the engine; they
//! hand over (or consume) the JSON shapes defined here. Everything else in
//! the engine works on the structured types from [`crate::unit`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::unit::UnitId;

/// One unit as reported by the external discovery step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredUnit {
    /// Canonical wire identifier (`group::title::…`).
    pub id: String,
    /// Owning group, known structurally even for never-seen units.
    pub group: String,
}

impl DiscoveredUnit {
    /// Structured identifier for engine-internal use.
    pub fn unit_id(&self) -> UnitId {
        UnitId::parse(&self.id)
    }
}

/// Measured durations reported by one lane after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementBatch {
    /// 1-based lane index that produced these measurements.
    pub lane_index: usize,
    /// Free-form label for the reporting lane.
    pub group_label: String,
    /// Wire identifier → measured duration in milliseconds.
    pub measurements: BTreeMap<String, u64>,
}
