//! Speed × Δp pivot tables of mean efficiency values.

use std::cmp::Ordering;

use thiserror::Error;

use crate::core::loaders::{MeasurementRecord, Metric};
use crate::core::transforms::DeltapTenths;

use super::series::distinct_deltaps;

/// Minimum rows and columns needed to draw a contour.
pub const MIN_PIVOT_EXTENT: usize = 2;

/// Soft error for pivots that cannot be rendered.
#[derive(Debug, Error)]
pub enum PivotError {
    #[error("pivot has {rows} speed rows and {columns} pressure columns, at least {min} of each are required", min = MIN_PIVOT_EXTENT)]
    Degenerate { rows: usize, columns: usize },
}

/// Result type for pivot operations.
pub type Result<T> = std::result::Result<T, PivotError>;

/// Dense matrix of mean metric values.
///
/// Rows are the distinct raw speeds, columns the distinct rounded Δp
/// values, both ascending. `cells[row][column]` is `None` when no record
/// contributes to that pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub metric: Metric,
    pub speeds: Vec<f64>,
    pub deltaps: Vec<DeltapTenths>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Pivot {
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.speeds.len(), self.deltaps.len())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    pub fn is_plottable(&self) -> bool {
        let (rows, columns) = self.shape();
        rows >= MIN_PIVOT_EXTENT && columns >= MIN_PIVOT_EXTENT
    }

    /// Column positions in MPa.
    pub fn deltap_values(&self) -> Vec<f64> {
        self.deltaps.iter().map(|dp| dp.value()).collect()
    }

    /// Smallest and largest defined cell, or `None` if every cell is missing.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn distinct_speeds(records: &[MeasurementRecord]) -> Vec<f64> {
    let mut speeds: Vec<f64> = records.iter().map(|r| r.speed).collect();
    speeds.sort_by(f64::total_cmp);
    speeds.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
    speeds
}

/// Build the mean pivot of `metric` over `records`.
///
/// The result may be degenerate; see [`build_plottable_pivot`].
pub fn build_pivot(records: &[MeasurementRecord], metric: Metric) -> Pivot {
    let speeds = distinct_speeds(records);
    let deltaps = distinct_deltaps(records);

    let mut sums = vec![vec![(0.0f64, 0usize); deltaps.len()]; speeds.len()];

    for record in records {
        let row = speeds.binary_search_by(|s| s.total_cmp(&record.speed));
        let col = deltaps.binary_search(&DeltapTenths::from_deltap(record.deltap));
        if let (Ok(row), Ok(col)) = (row, col) {
            let cell = &mut sums[row][col];
            cell.0 += record.metric(metric);
            cell.1 += 1;
        }
    }

    let cells = sums
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                .collect()
        })
        .collect();

    Pivot {
        metric,
        speeds,
        deltaps,
        cells,
    }
}

/// Build a pivot and reject it when it has fewer than two rows or columns.
pub fn build_plottable_pivot(records: &[MeasurementRecord], metric: Metric) -> Result<Pivot> {
    let pivot = build_pivot(records, metric);
    if !pivot.is_plottable() {
        let (rows, columns) = pivot.shape();
        return Err(PivotError::Degenerate { rows, columns });
    }
    Ok(pivot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(speed: f64, deltap: f64, etat: f64) -> MeasurementRecord {
        MeasurementRecord {
            speed,
            displacement: 45.0,
            deltap,
            etat,
            etav: 95.0,
            etam: 94.0,
        }
    }

    #[test]
    fn test_pivot_cells_are_means() {
        let records = vec![
            rec(1000.0, 7.96, 90.0),
            rec(1000.0, 8.04, 92.0),
            rec(1000.0, 16.0, 85.0),
            rec(1500.0, 8.0, 93.0),
            rec(1000.0, 8.01, 94.0),
        ];
        let pivot = build_pivot(&records, Metric::Etat);

        assert_eq!(pivot.speeds, vec![1000.0, 1500.0]);
        assert_eq!(pivot.deltaps, vec![DeltapTenths(80), DeltapTenths(160)]);
        assert_eq!(pivot.shape(), (2, 2));
        assert_eq!(pivot.get(0, 0), Some(92.0));
        assert_eq!(pivot.get(0, 1), Some(85.0));
        assert_eq!(pivot.get(1, 0), Some(93.0));
        assert!(pivot.is_plottable());
    }

    #[test]
    fn test_missing_cells_are_none_not_zero() {
        let records = vec![rec(1000.0, 8.0, 90.0), rec(1500.0, 16.0, 80.0)];
        let pivot = build_pivot(&records, Metric::Etat);

        assert_eq!(pivot.get(0, 1), None);
        assert_eq!(pivot.get(1, 0), None);
        assert_eq!(pivot.get(5, 5), None);
        assert_eq!(pivot.value_range(), Some((80.0, 90.0)));
    }

    #[test]
    fn test_single_speed_pivot_is_degenerate() {
        let records = vec![rec(1000.0, 8.0, 90.0), rec(1000.0, 16.0, 80.0), rec(1000.0, 24.0, 70.0)];
        let err = build_plottable_pivot(&records, Metric::Etat).unwrap_err();
        match err {
            PivotError::Degenerate { rows, columns } => {
                assert_eq!(rows, 1);
                assert_eq!(columns, 3);
            }
        }
    }

    #[test]
    fn test_single_pressure_pivot_is_degenerate() {
        let records = vec![rec(1000.0, 8.0, 90.0), rec(1500.0, 8.04, 80.0)];
        assert!(build_plottable_pivot(&records, Metric::Etat).is_err());
    }

    #[test]
    fn test_pivot_uses_selected_metric() {
        let records = vec![
            rec(1000.0, 8.0, 90.0),
            rec(1500.0, 8.0, 91.0),
            rec(1000.0, 16.0, 88.0),
            rec(1500.0, 16.0, 89.0),
        ];
        let pivot = build_plottable_pivot(&records, Metric::Etav).unwrap();
        assert_eq!(pivot.metric, Metric::Etav);
        assert_eq!(pivot.value_range(), Some((95.0, 95.0)));
        assert_eq!(pivot.deltap_values(), vec![8.0, 16.0]);
    }
}
