//! Canonical unit identifiers and the schedulable unit record.
//!
//! A unit's wire identifier is `group::title-1::…::final-title`, where
//! `group` is a forward-slash-normalized relative path and title segments
//! are free text. Titles may themselves contain the separator, so parsing
//! is first-segment-anchored: everything after the first `::` is opaque.
//! Inside the engine the identifier is always the structured pair
//! `{group, titles}`; joining and splitting happen only at the wire
//! boundary.

use std::fmt;

/// Separator between the group and title segments in the wire format.
pub const ID_SEPARATOR: &str = "::";

/// Structured canonical identifier for a schedulable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    group: String,
    titles: Vec<String>,
}

impl UnitId {
    /// Build an identifier from a known group and ordered title segments.
    pub fn new(group: impl Into<String>, titles: Vec<String>) -> Self {
        Self {
            group: normalize_group(&group.into()),
            titles,
        }
    }

    /// Parse a wire identifier.
    ///
    /// Only the first separator is structural; the remainder is kept as a
    /// single opaque title segment so that titles containing `::` survive
    /// a round-trip unchanged.
    pub fn parse(wire: &str) -> Self {
        match wire.split_once(ID_SEPARATOR) {
            Some((group, rest)) => Self {
                group: normalize_group(group),
                titles: vec![rest.to_string()],
            },
            None => Self {
                group: normalize_group(wire),
                titles: Vec::new(),
            },
        }
    }

    /// The owning group (file/bucket) used for affinity.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Ordered title segments (opaque after a wire round-trip).
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Join back into the wire format.
    pub fn to_wire(&self) -> String {
        let mut out = self.group.clone();
        for title in &self.titles {
            out.push_str(ID_SEPARATOR);
            out.push_str(title);
        }
        out
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Normalize a group path to forward slashes.
fn normalize_group(group: &str) -> String {
    group.replace('\\', "/")
}

/// One schedulable item: identifier, weight, and whether the weight was
/// guessed rather than measured. Immutable — constructed fresh each
/// invocation from discovery output plus the timing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    /// Duration in milliseconds (measured or estimated).
    pub duration_ms: u64,
    /// True when no direct historical measurement existed.
    pub estimated: bool,
}

impl Unit {
    pub fn new(id: UnitId, duration_ms: u64, estimated: bool) -> Self {
        Self {
            id,
            duration_ms,
            estimated,
        }
    }

    /// The unit's affinity group.
    pub fn group(&self) -> &str {
        self.id.group()
    }
}
