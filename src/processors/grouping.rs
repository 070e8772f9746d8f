//! Partitioning of measurements by rounded displacement and pressure.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::core::loaders::MeasurementRecord;
use crate::core::transforms::{normalize, round_displacement, DeltapTenths};

/// Soft errors raised when a requested group has no members.
#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("No data found for Δp ≈ {target} MPa (tolerance {tolerance} MPa)")]
    EmptyGroup { target: f64, tolerance: f64 },

    #[error("No data in group {0}")]
    NoData(GroupKey),
}

/// Result type for grouping operations.
pub type Result<T> = std::result::Result<T, GroupingError>;

/// How finely records are partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Rounded displacement only
    Coarse,
    /// Rounded displacement and rounded Δp
    Fine,
}

/// Key of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Displacement(i64),
    DisplacementPressure(i64, DeltapTenths),
}

impl GroupKey {
    /// Key of a record at the given granularity.
    pub fn for_record(record: &MeasurementRecord, granularity: Granularity) -> Self {
        let keys = normalize(record);
        match granularity {
            Granularity::Coarse => GroupKey::Displacement(keys.displacement),
            Granularity::Fine => GroupKey::DisplacementPressure(keys.displacement, keys.deltap),
        }
    }

    /// Rounded displacement of the group.
    pub fn displacement(&self) -> i64 {
        match *self {
            GroupKey::Displacement(d) | GroupKey::DisplacementPressure(d, _) => d,
        }
    }

    /// Rounded Δp of the group, if the key carries one.
    pub fn deltap(&self) -> Option<DeltapTenths> {
        match *self {
            GroupKey::Displacement(_) => None,
            GroupKey::DisplacementPressure(_, dp) => Some(dp),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Displacement(d) => write!(f, "{} cc/rev", d),
            GroupKey::DisplacementPressure(d, dp) => write!(f, "{} cc/rev, Δp = {} MPa", d, dp),
        }
    }
}

/// Groups in ascending key order, members in input order.
pub type Groups = BTreeMap<GroupKey, Vec<MeasurementRecord>>;

/// Partition records by an arbitrary key.
///
/// Members keep their input order; groups iterate by ascending key.
pub fn group_by<K, F>(records: &[MeasurementRecord], key_fn: F) -> BTreeMap<K, Vec<MeasurementRecord>>
where
    K: Ord,
    F: Fn(&MeasurementRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<MeasurementRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key_fn(record)).or_default().push(*record);
    }
    groups
}

/// Partition records at the given granularity.
pub fn group_records(records: &[MeasurementRecord], granularity: Granularity) -> Groups {
    group_by(records, |r| GroupKey::for_record(r, granularity))
}

/// Partition records by rounded displacement.
pub fn group_by_displacement(records: &[MeasurementRecord]) -> BTreeMap<i64, Vec<MeasurementRecord>> {
    group_by(records, |r| round_displacement(r.displacement))
}

/// Look up a group, signalling [`GroupingError::NoData`] when it is absent or empty.
pub fn select_group(groups: &Groups, key: GroupKey) -> Result<&[MeasurementRecord]> {
    match groups.get(&key) {
        Some(members) if !members.is_empty() => Ok(members.as_slice()),
        _ => Err(GroupingError::NoData(key)),
    }
}

/// Records whose raw Δp lies within `tolerance` of `target`.
///
/// # Errors
///
/// Returns [`GroupingError::EmptyGroup`] when nothing matches, so callers
/// can skip the target instead of plotting an empty chart.
pub fn filter_near_pressure(
    records: &[MeasurementRecord],
    target: f64,
    tolerance: f64,
) -> Result<Vec<MeasurementRecord>> {
    let matching: Vec<MeasurementRecord> = records
        .iter()
        .filter(|r| (r.deltap - target).abs() <= tolerance)
        .copied()
        .collect();

    if matching.is_empty() {
        return Err(GroupingError::EmptyGroup { target, tolerance });
    }

    Ok(matching)
}
