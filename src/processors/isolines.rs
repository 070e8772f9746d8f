//! Iso-lines traced over a pivot grid with marching squares.
//!
//! Coordinates are in data units: x is Δp in MPa, y is speed. Only grid
//! squares whose four corners are defined contribute segments, so missing
//! cells leave gaps instead of bending lines toward zero.

use super::pivot::Pivot;

/// A straight piece of an iso-line between two points.
pub type Segment = ((f64, f64), (f64, f64));

/// All segments of one level.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoLine {
    pub level: f64,
    pub segments: Vec<Segment>,
}

impl IsoLine {
    /// Where to print the level value: the midpoint of the middle segment.
    pub fn label_anchor(&self) -> Option<(f64, f64)> {
        let ((x0, y0), (x1, y1)) = *self.segments.get(self.segments.len() / 2)?;
        Some(((x0 + x1) / 2.0, (y0 + y1) / 2.0))
    }
}

/// Point on the edge between `a` (value `va`) and `b` (value `vb`) where
/// the linear interpolation reaches `level`, if the edge crosses it.
fn crossing(a: (f64, f64), va: f64, b: (f64, f64), vb: f64, level: f64) -> Option<(f64, f64)> {
    if (va < level) == (vb < level) {
        return None;
    }
    let t = (level - va) / (vb - va);
    Some((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)))
}

/// Segments of `level` across every fully defined square of `pivot`.
pub fn iso_segments(pivot: &Pivot, level: f64) -> Vec<Segment> {
    let xs = pivot.deltap_values();
    let ys = &pivot.speeds;
    let mut segments = Vec::new();

    for row in 0..ys.len().saturating_sub(1) {
        for col in 0..xs.len().saturating_sub(1) {
            let corners = (
                pivot.get(row, col),
                pivot.get(row, col + 1),
                pivot.get(row + 1, col + 1),
                pivot.get(row + 1, col),
            );
            let (v00, v01, v11, v10) = match corners {
                (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                _ => continue,
            };

            let p00 = (xs[col], ys[row]);
            let p01 = (xs[col + 1], ys[row]);
            let p11 = (xs[col + 1], ys[row + 1]);
            let p10 = (xs[col], ys[row + 1]);

            // Edges in order: bottom, right, top, left
            let edges = [
                crossing(p00, v00, p01, v01, level),
                crossing(p01, v01, p11, v11, level),
                crossing(p10, v10, p11, v11, level),
                crossing(p00, v00, p10, v10, level),
            ];

            match edges {
                [Some(bottom), Some(right), Some(top), Some(left)] => {
                    // Saddle: the centre value decides which corners are joined
                    let centre = (v00 + v01 + v11 + v10) / 4.0;
                    if (centre < level) == (v00 < level) {
                        segments.push((bottom, right));
                        segments.push((top, left));
                    } else {
                        segments.push((bottom, left));
                        segments.push((right, top));
                    }
                }
                _ => {
                    let points: Vec<(f64, f64)> = edges.iter().flatten().copied().collect();
                    if let [a, b] = points.as_slice() {
                        segments.push((*a, *b));
                    }
                }
            }
        }
    }

    segments
}

/// Iso-lines for each level that crosses the pivot; levels outside the
/// data range are left out.
pub fn iso_lines(pivot: &Pivot, levels: &[f64]) -> Vec<IsoLine> {
    levels
        .iter()
        .map(|&level| IsoLine {
            level,
            segments: iso_segments(pivot, level),
        })
        .filter(|line| !line.segments.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::Metric;
    use crate::core::transforms::DeltapTenths;

    fn pivot(speeds: &[f64], deltaps: &[i64], cells: Vec<Vec<Option<f64>>>) -> Pivot {
        Pivot {
            metric: Metric::Etat,
            speeds: speeds.to_vec(),
            deltaps: deltaps.iter().map(|&t| DeltapTenths(t)).collect(),
            cells,
        }
    }

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_single_square_interpolates_crossings() {
        // Rises along Δp only, so the 85 line is vertical at Δp = 15
        let grid = pivot(
            &[1000.0, 2000.0],
            &[100, 200],
            vec![vec![Some(80.0), Some(90.0)], vec![Some(80.0), Some(90.0)]],
        );

        let segments = iso_segments(&grid, 85.0);
        assert_eq!(segments.len(), 1);
        let (a, b) = segments[0];
        assert!(close(a, (15.0, 1000.0)));
        assert!(close(b, (15.0, 2000.0)));
    }

    #[test]
    fn test_level_outside_range_has_no_segments() {
        let grid = pivot(
            &[1000.0, 2000.0],
            &[100, 200],
            vec![vec![Some(80.0), Some(90.0)], vec![Some(82.0), Some(88.0)]],
        );
        assert!(iso_segments(&grid, 95.0).is_empty());
        assert!(iso_segments(&grid, 70.0).is_empty());
    }

    #[test]
    fn test_squares_with_missing_corners_are_skipped() {
        let grid = pivot(
            &[1000.0, 1500.0, 2000.0],
            &[100, 200],
            vec![
                vec![Some(80.0), Some(90.0)],
                vec![Some(80.0), Some(90.0)],
                vec![None, Some(90.0)],
            ],
        );

        let segments = iso_segments(&grid, 85.0);
        assert_eq!(segments.len(), 1);
        assert!(segments.iter().all(|(a, b)| a.1 <= 1500.0 && b.1 <= 1500.0));
    }

    #[test]
    fn test_saddle_yields_two_segments() {
        let grid = pivot(
            &[1000.0, 2000.0],
            &[100, 200],
            vec![vec![Some(90.0), Some(80.0)], vec![Some(80.0), Some(90.0)]],
        );
        assert_eq!(iso_segments(&grid, 85.0).len(), 2);
    }

    #[test]
    fn test_iso_lines_on_three_by_three_grid() {
        let grid = pivot(
            &[1000.0, 1500.0, 2000.0],
            &[100, 200, 300],
            vec![
                vec![Some(80.0), Some(82.0), Some(84.0)],
                vec![Some(82.0), Some(84.0), Some(86.0)],
                vec![Some(84.0), Some(86.0), Some(88.0)],
            ],
        );

        let lines = iso_lines(&grid, &[78.0, 83.0, 85.0, 87.0, 92.0]);
        let levels: Vec<f64> = lines.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![83.0, 85.0, 87.0]);

        // 83 cuts the lower-left corner squares only
        assert_eq!(lines[0].segments.len(), 3);
        let anchor = lines[1].label_anchor().unwrap();
        assert!(anchor.0 > 10.0 && anchor.0 < 30.0);
        assert!(anchor.1 > 1000.0 && anchor.1 < 2000.0);
    }
}
