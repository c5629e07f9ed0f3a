//! TimingStore — versioned JSON document of smoothed unit durations.
//!
//! The persisted shape is `{schemaVersion, updatedAt, records}` with one
//! record per wire identifier. Exactly one schema version is accepted on
//! read; any other tag (older included) is treated as absent data, so a
//! cold start, a corrupt cache, or a version upgrade degrades estimation
//! quality but never blocks scheduling. Updates are functional — `merge`
//! and `prune` return new stores and never mutate their input.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shardline_core::UnitId;
use shardline_core::boundary::MeasurementBatch;

use crate::error::{TimingError, TimingResult};

/// The one schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Exponential moving average with `alpha` weighting the new measurement.
pub fn ema(old_ms: u64, measured_ms: u64, alpha: f64) -> u64 {
    (alpha * measured_ms as f64 + (1.0 - alpha) * old_ms as f64).round() as u64
}

/// Smoothed history for a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecord {
    /// Owning group, derived from the wire identifier on first merge.
    pub group: String,
    /// Exponentially smoothed duration estimate in milliseconds.
    pub duration: u64,
    /// How many merges contributed to this record.
    pub runs: u32,
    /// When a measurement for this unit was last merged.
    pub last_seen: DateTime<Utc>,
}

/// The full persisted document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    schema_version: u32,
    updated_at: DateTime<Utc>,
    records: BTreeMap<String, TimingRecord>,
}

/// Minimal probe used to dispatch on the version tag before committing
/// to the full record shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    schema_version: u32,
}

/// In-memory timing store. Owned exclusively by this crate; callers pass
/// snapshots around and receive new values from `merge`/`prune`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingStore {
    updated_at: DateTime<Utc>,
    records: BTreeMap<String, TimingRecord>,
}

impl Default for TimingStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl TimingStore {
    /// A fresh store with no history, stamped with the current version.
    pub fn empty() -> Self {
        Self {
            updated_at: Utc::now(),
            records: BTreeMap::new(),
        }
    }

    /// Deserialize a persisted document.
    ///
    /// Never fails: empty input, unparseable JSON, or a schema tag other
    /// than [`SCHEMA_VERSION`] all yield a fresh empty store.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let probe: VersionProbe = match serde_json::from_slice(bytes) {
            Ok(probe) => probe,
            Err(error) => {
                warn!(%error, "timing document unreadable; starting cold");
                return Self::empty();
            }
        };
        match probe.schema_version {
            SCHEMA_VERSION => match serde_json::from_slice::<StoreDocument>(bytes) {
                Ok(doc) => Self {
                    updated_at: doc.updated_at,
                    records: doc.records,
                },
                Err(error) => {
                    warn!(%error, "timing records malformed; starting cold");
                    Self::empty()
                }
            },
            other => {
                warn!(
                    found = other,
                    expected = SCHEMA_VERSION,
                    "timing schema mismatch; starting cold"
                );
                Self::empty()
            }
        }
    }

    /// Serialize to the persisted JSON document.
    pub fn to_bytes(&self) -> TimingResult<Vec<u8>> {
        let doc = StoreDocument {
            schema_version: SCHEMA_VERSION,
            updated_at: self.updated_at,
            records: self.records.clone(),
        };
        serde_json::to_vec_pretty(&doc).map_err(|e| TimingError::Serialize(e.to_string()))
    }

    /// Load a store from disk. A missing file is a normal cold start; any
    /// other I/O failure is a hard error for the caller.
    pub fn load_file(path: &Path) -> TimingResult<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Self::from_bytes(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "no timing document yet; starting cold");
                Ok(Self::empty())
            }
            Err(e) => Err(TimingError::Read(e.to_string())),
        }
    }

    /// Persist the store to disk.
    pub fn save_file(&self, path: &Path) -> TimingResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| TimingError::Write(e.to_string()))
    }

    /// Fold measurement batches into the history.
    ///
    /// Existing records are EMA-blended (`alpha` weighting the new value)
    /// and their run count incremented; unseen ids create records with
    /// `runs = 1` and a group derived from the wire identifier. Same-id
    /// entries across batches fold sequentially in input order.
    pub fn merge(&self, batches: &[MeasurementBatch], alpha: f64) -> Self {
        self.merge_at(Utc::now(), batches, alpha)
    }

    fn merge_at(&self, now: DateTime<Utc>, batches: &[MeasurementBatch], alpha: f64) -> Self {
        let mut records = self.records.clone();
        let mut blended = 0usize;
        let mut created = 0usize;
        for batch in batches {
            for (id, &measured_ms) in &batch.measurements {
                match records.get_mut(id) {
                    Some(record) => {
                        record.duration = ema(record.duration, measured_ms, alpha);
                        record.runs += 1;
                        record.last_seen = now;
                        blended += 1;
                    }
                    None => {
                        records.insert(
                            id.clone(),
                            TimingRecord {
                                group: UnitId::parse(id).group().to_string(),
                                duration: measured_ms,
                                runs: 1,
                                last_seen: now,
                            },
                        );
                        created += 1;
                    }
                }
            }
        }
        debug!(blended, created, "merged measurement batches");
        Self {
            updated_at: now,
            records,
        }
    }

    /// Drop stale records, and (when `known_ids` is given) records whose
    /// unit no longer exists upstream. `updatedAt` is preserved — pruning
    /// learns nothing — which makes pruning idempotent for a fixed cutoff.
    pub fn prune(&self, max_age_days: u32, known_ids: Option<&HashSet<String>>) -> Self {
        self.prune_at(Utc::now(), max_age_days, known_ids)
    }

    fn prune_at(
        &self,
        now: DateTime<Utc>,
        max_age_days: u32,
        known_ids: Option<&HashSet<String>>,
    ) -> Self {
        let cutoff = now - Duration::days(i64::from(max_age_days));
        let records: BTreeMap<String, TimingRecord> = self
            .records
            .iter()
            .filter(|(id, record)| {
                record.last_seen >= cutoff
                    && known_ids.is_none_or(|known| known.contains(id.as_str()))
            })
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        let dropped = self.records.len() - records.len();
        if dropped > 0 {
            debug!(dropped, remaining = records.len(), "pruned timing records");
        }
        Self {
            updated_at: self.updated_at,
            records,
        }
    }

    /// Look up the record for a wire identifier.
    pub fn get(&self, id: &str) -> Option<&TimingRecord> {
        self.records.get(id)
    }

    /// Sum of smoothed durations across a group; `None` when the group
    /// has no records at all.
    pub fn group_duration(&self, group: &str) -> Option<u64> {
        let mut sum = 0u64;
        let mut matched = false;
        for record in self.records.values() {
            if record.group == group {
                sum += record.duration;
                matched = true;
            }
        }
        matched.then_some(sum)
    }

    /// All records, keyed by wire identifier.
    pub fn records(&self) -> &BTreeMap<String, TimingRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn batch(pairs: &[(&str, u64)]) -> MeasurementBatch {
        MeasurementBatch {
            lane_index: 1,
            group_label: "shard-1".to_string(),
            measurements: pairs
                .iter()
                .map(|(id, ms)| (id.to_string(), *ms))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn ema_matches_reference_values() {
        assert_eq!(ema(200, 100, 0.3), 170);
        assert_eq!(ema(200, 100, 0.5), 150);
        // Lower alpha weighs the new measurement less.
        assert!(ema(200, 100, 0.1) > ema(200, 100, 0.9));
    }

    #[test]
    fn merge_creates_record_with_group_from_wire_id() {
        let store = TimingStore::empty();
        let merged = store.merge_at(at(1), &[batch(&[("src/a.test.ts::case", 1200)])], 0.3);

        let record = merged.get("src/a.test.ts::case").unwrap();
        assert_eq!(record.group, "src/a.test.ts");
        assert_eq!(record.duration, 1200);
        assert_eq!(record.runs, 1);
        assert_eq!(record.last_seen, at(1));
    }

    #[test]
    fn merge_blends_existing_record() {
        let store = TimingStore::empty()
            .merge_at(at(1), &[batch(&[("a.ts::t", 200)])], 0.3)
            .merge_at(at(2), &[batch(&[("a.ts::t", 100)])], 0.3);

        let record = store.get("a.ts::t").unwrap();
        assert_eq!(record.duration, 170);
        assert_eq!(record.runs, 2);
        assert_eq!(record.last_seen, at(2));
    }

    #[test]
    fn merge_does_not_mutate_input() {
        let store = TimingStore::empty().merge_at(at(1), &[batch(&[("a.ts::t", 200)])], 0.3);
        let _ = store.merge_at(at(2), &[batch(&[("a.ts::t", 100)])], 0.3);
        assert_eq!(store.get("a.ts::t").unwrap().duration, 200);
    }

    #[test]
    fn merge_folds_same_id_across_batches_in_order() {
        let store = TimingStore::empty().merge_at(
            at(1),
            &[batch(&[("a.ts::t", 200)]), batch(&[("a.ts::t", 100)])],
            0.5,
        );
        // 200 created by the first batch, then blended: 0.5*100 + 0.5*200.
        let record = store.get("a.ts::t").unwrap();
        assert_eq!(record.duration, 150);
        assert_eq!(record.runs, 2);
    }

    #[test]
    fn prune_drops_stale_records() {
        let store = TimingStore::empty()
            .merge_at(at(1), &[batch(&[("old.ts::t", 100)])], 0.3)
            .merge_at(at(20), &[batch(&[("fresh.ts::t", 100)])], 0.3);

        let pruned = store.prune_at(at(20), 7, None);
        assert!(pruned.get("old.ts::t").is_none());
        assert!(pruned.get("fresh.ts::t").is_some());
    }

    #[test]
    fn prune_drops_unknown_ids_when_supplied() {
        let store = TimingStore::empty()
            .merge_at(at(1), &[batch(&[("kept.ts::t", 100), ("gone.ts::t", 100)])], 0.3);

        let known: HashSet<String> = ["kept.ts::t".to_string()].into();
        let pruned = store.prune_at(at(1), 30, Some(&known));
        assert!(pruned.get("kept.ts::t").is_some());
        assert!(pruned.get("gone.ts::t").is_none());
    }

    #[test]
    fn prune_is_idempotent() {
        let store = TimingStore::empty()
            .merge_at(at(1), &[batch(&[("old.ts::t", 100)])], 0.3)
            .merge_at(at(20), &[batch(&[("fresh.ts::t", 100)])], 0.3);

        let once = store.prune_at(at(20), 7, None);
        let twice = once.prune_at(at(20), 7, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn group_duration_sums_matching_records() {
        let store = TimingStore::empty().merge_at(
            at(1),
            &[batch(&[("a.ts::one", 100), ("a.ts::two", 250), ("b.ts::one", 999)])],
            0.3,
        );
        assert_eq!(store.group_duration("a.ts"), Some(350));
        assert_eq!(store.group_duration("b.ts"), Some(999));
        assert_eq!(store.group_duration("missing.ts"), None);
    }

    #[test]
    fn round_trips_through_bytes() {
        let store = TimingStore::empty().merge_at(at(1), &[batch(&[("a.ts::t", 123)])], 0.3);
        let bytes = store.to_bytes().unwrap();
        let loaded = TimingStore::from_bytes(&bytes);
        assert_eq!(loaded, store);
    }

    #[test]
    fn wire_document_uses_camel_case_fields() {
        let store = TimingStore::empty().merge_at(at(1), &[batch(&[("a.ts::t", 123)])], 0.3);
        let value: serde_json::Value =
            serde_json::from_slice(&store.to_bytes().unwrap()).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert!(value["updatedAt"].is_string());
        assert!(value["records"]["a.ts::t"]["lastSeen"].is_string());
        assert_eq!(value["records"]["a.ts::t"]["duration"], 123);
    }

    #[test]
    fn schema_mismatch_degrades_to_empty() {
        let wrong = br#"{"schemaVersion": 99, "updatedAt": "2026-03-01T12:00:00Z", "records": {}}"#;
        assert!(TimingStore::from_bytes(wrong).is_empty());
    }

    #[test]
    fn garbage_bytes_degrade_to_empty() {
        assert!(TimingStore::from_bytes(b"not json at all").is_empty());
        assert!(TimingStore::from_bytes(b"").is_empty());
        assert!(TimingStore::from_bytes(br#"{"records": []}"#).is_empty());
    }

    #[test]
    fn load_missing_file_starts_cold() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::load_file(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_then_load_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timings.json");

        let store = TimingStore::empty().merge_at(at(1), &[batch(&[("a.ts::t", 321)])], 0.3);
        store.save_file(&path).unwrap();

        let loaded = TimingStore::load_file(&path).unwrap();
        assert_eq!(loaded.get("a.ts::t").unwrap().duration, 321);
    }
}
