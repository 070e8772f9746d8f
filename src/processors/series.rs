//! Speed-ordered series of one efficiency metric.

use std::collections::BTreeSet;

use crate::core::loaders::{MeasurementRecord, Metric};
use crate::core::transforms::DeltapTenths;

use super::grouping::{group_by, Granularity, GroupKey};

/// (speed, value) pairs of one metric, ascending by speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub metric: Metric,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest metric value, or `None` for an empty series.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, &(_, v)| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Smallest and largest speed, or `None` for an empty series.
    pub fn speed_range(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.0;
        let last = self.points.last()?.0;
        Some((first, last))
    }
}

/// Build the series of `metric` over `records`, sorted by speed.
///
/// Records sharing a speed keep their relative input order.
pub fn build_series(records: &[MeasurementRecord], metric: Metric) -> Series {
    let mut points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.speed, r.metric(metric)))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    Series { metric, points }
}

/// Distinct rounded Δp values present in `records`, ascending.
pub fn distinct_deltaps(records: &[MeasurementRecord]) -> Vec<DeltapTenths> {
    records
        .iter()
        .map(|r| DeltapTenths::from_deltap(r.deltap))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Evenly spaced subset of an already sorted list.
///
/// `step = max(len / target_max, 1)` and every `step`-th element is kept,
/// starting with the first. This bounds how many curves end up on one
/// chart; it may keep slightly more than `target_max` when the length is
/// not a multiple of it. A `target_max` of zero is treated as one.
pub fn subsample_evenly<T: Clone>(sorted: &[T], target_max: usize) -> Vec<T> {
    let step = (sorted.len() / target_max.max(1)).max(1);
    sorted.iter().step_by(step).cloned().collect()
}

/// One series per rounded Δp within a displacement group.
///
/// The distinct pressures are thinned with [`subsample_evenly`] to at most
/// about `max_curves` values. Results are ordered by ascending Δp.
pub fn pressure_series(
    group: &[MeasurementRecord],
    metric: Metric,
    max_curves: usize,
) -> Vec<(DeltapTenths, Series)> {
    let kept = subsample_evenly(&distinct_deltaps(group), max_curves);
    let by_pressure = group_by(group, |r| GroupKey::for_record(r, Granularity::Fine));

    by_pressure
        .into_iter()
        .filter_map(|(key, members)| {
            let dp = key.deltap()?;
            kept.binary_search(&dp)
                .ok()
                .map(|_| (dp, build_series(&members, metric)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(speed: f64, deltap: f64, etat: f64) -> MeasurementRecord {
        MeasurementRecord {
            speed,
            displacement: 32.0,
            deltap,
            etat,
            etav: etat + 5.0,
            etam: etat + 3.0,
        }
    }

    #[test]
    fn test_series_sorted_by_speed() {
        let records = vec![
            rec(2000.0, 8.0, 92.0),
            rec(500.0, 8.0, 80.0),
            rec(1500.0, 8.0, 91.0),
            rec(1000.0, 8.0, 88.0),
        ];
        let series = build_series(&records, Metric::Etat);

        let speeds: Vec<f64> = series.points.iter().map(|p| p.0).collect();
        assert_eq!(speeds, vec![500.0, 1000.0, 1500.0, 2000.0]);
        assert_eq!(series.points[0].1, 80.0);
        assert_eq!(series.metric, Metric::Etat);
    }

    #[test]
    fn test_series_is_stable_on_equal_speed() {
        let records = vec![
            rec(1500.0, 8.0, 70.0),
            rec(1000.0, 8.0, 2.0),
            rec(1000.0, 8.0, 1.0),
            rec(1000.0, 8.0, 3.0),
        ];

        let series = build_series(&records, Metric::Etat);
        let values: Vec<f64> = series.points.iter().map(|p| p.1).collect();
        assert_eq!(values, vec![2.0, 1.0, 3.0, 70.0]);

        let etav = build_series(&records, Metric::Etav);
        let values: Vec<f64> = etav.points.iter().map(|p| p.1).collect();
        assert_eq!(values, vec![7.0, 6.0, 8.0, 75.0]);
    }

    #[test]
    fn test_series_ranges() {
        let series = build_series(
            &[rec(1000.0, 8.0, 88.0), rec(500.0, 8.0, 91.0), rec(1500.0, 8.0, 85.0)],
            Metric::Etat,
        );
        assert_eq!(series.value_range(), Some((85.0, 91.0)));
        assert_eq!(series.speed_range(), Some((500.0, 1500.0)));

        let empty = build_series(&[], Metric::Etam);
        assert!(empty.is_empty());
        assert_eq!(empty.value_range(), None);
    }

    #[test]
    fn test_distinct_deltaps_sorted_and_rounded() {
        let records = vec![
            rec(1000.0, 8.04, 1.0),
            rec(1000.0, 7.96, 1.0),
            rec(1000.0, 32.1, 1.0),
            rec(1000.0, 11.0, 1.0),
        ];
        let dps = distinct_deltaps(&records);
        assert_eq!(dps, vec![DeltapTenths(80), DeltapTenths(110), DeltapTenths(321)]);
    }

    #[test]
    fn test_subsample_evenly_step_rule() {
        let values: Vec<u32> = (0..17).collect();
        assert_eq!(subsample_evenly(&values, 8), vec![0, 2, 4, 6, 8, 10, 12, 14, 16]);

        let values: Vec<u32> = (0..24).collect();
        assert_eq!(subsample_evenly(&values, 8), vec![0, 3, 6, 9, 12, 15, 18, 21]);

        let few: Vec<u32> = (0..5).collect();
        assert_eq!(subsample_evenly(&few, 8), few);

        assert_eq!(subsample_evenly(&few, 0), vec![0]);
        assert!(subsample_evenly::<u32>(&[], 8).is_empty());
    }

    #[test]
    fn test_pressure_series_limits_curves() {
        let mut records = Vec::new();
        for i in 0..16 {
            let dp = 5.0 + i as f64;
            records.push(rec(1500.0, dp, 90.0));
            records.push(rec(1000.0, dp, 85.0));
        }

        let curves = pressure_series(&records, Metric::Etat, 8);
        let dps: Vec<DeltapTenths> = curves.iter().map(|(dp, _)| *dp).collect();
        assert_eq!(dps.len(), 8);
        assert_eq!(dps[0], DeltapTenths(50));
        assert_eq!(dps[1], DeltapTenths(70));

        for (_, series) in &curves {
            assert_eq!(series.points, vec![(1000.0, 85.0), (1500.0, 90.0)]);
        }
    }
}
