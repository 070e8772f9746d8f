//! Renderer-independent chart descriptions.
//!
//! Each builder here turns measurement records into a list of charts with
//! deterministic file names. Groups without data or with degenerate pivots
//! are logged and skipped; they never produce a chart.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{GroupingConfig, RenderConfig};
use crate::core::loaders::{MeasurementRecord, Metric};

use super::grouping::{filter_near_pressure, group_by_displacement};
use super::pivot::{build_plottable_pivot, Pivot};
use super::series::{build_series, pressure_series, Series};

pub const SPEED_LABEL: &str = "Speed [RPM]";

/// One labelled line on a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub series: Series,
}

/// Efficiency against speed, one curve per group.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub file_name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub curves: Vec<Curve>,
}

/// Colour map used for filled contour charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    Viridis,
    Inferno,
}

/// Filled contour of a pivot over (Δp, speed).
#[derive(Debug, Clone, PartialEq)]
pub struct ContourChart {
    pub file_name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    pub pivot: Pivot,
    /// Ascending band boundaries
    pub levels: Vec<f64>,
    pub color_scale: ColorScale,
    /// Draw labelled iso-lines at each level and tick every level on the colour bar
    pub label_levels: bool,
}

/// `count` evenly spaced levels from `min` to `max` inclusive.
pub fn contour_levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    let count = count.max(2);
    if (max - min).abs() < f64::EPSILON {
        return vec![min - 0.5, max + 0.5];
    }
    let step = (max - min) / (count - 1) as f64;
    (0..count).map(|i| min + step * i as f64).collect()
}

/// Most levels an efficiency map gets; finer steps are widened to fit.
pub const MAX_STEPPED_LEVELS: usize = 200;

/// Levels from `floor(min)` in increments of `step` while below `ceil(max) + 1`.
///
/// A step that would exceed [`MAX_STEPPED_LEVELS`] is widened so the span
/// fits in that many levels.
pub fn stepped_levels(min: f64, max: f64, step: f64) -> Vec<f64> {
    let start = min.floor();
    let stop = max.ceil() + 1.0;

    let mut step = if step > 0.0 && step.is_finite() { step } else { 1.0 };
    let min_step = (stop - start) / MAX_STEPPED_LEVELS as f64;
    if step < min_step {
        warn!("Level step {} too fine for {}..{}, using {}", step, start, stop, min_step);
        step = min_step;
    }

    let mut levels = Vec::new();
    let mut i = 0usize;
    while levels.len() < MAX_STEPPED_LEVELS {
        let level = start + step * i as f64;
        if level >= stop {
            break;
        }
        levels.push(level);
        i += 1;
    }
    if levels.len() < 2 {
        levels.push(start + step);
    }
    levels
}

/// File name fragment of a target pressure: `11` for 11.0, `11p4` for 11.4.
pub fn pressure_file_key(target: f64) -> String {
    if target.fract() == 0.0 {
        format!("{}", target as i64)
    } else {
        format!("{:.1}", target).replace('.', "p")
    }
}

/// Per target pressure and metric: one curve per rounded displacement.
///
/// Targets with no record within tolerance are skipped with a warning.
pub fn displacement_curve_charts(
    records: &[MeasurementRecord],
    grouping: &GroupingConfig,
) -> Vec<LineChart> {
    let mut charts = Vec::new();

    for &target in &grouping.target_pressures {
        let near = match filter_near_pressure(records, target, grouping.pressure_tolerance) {
            Ok(near) => near,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        let by_displacement = group_by_displacement(&near);

        for metric in Metric::ALL {
            let curves = by_displacement
                .iter()
                .map(|(disp, members)| Curve {
                    label: format!("{} cc/rev", disp),
                    series: build_series(members, metric),
                })
                .collect();

            charts.push(LineChart {
                file_name: format!("{}_vs_speed_dp_{}mpa.png", metric.file_key(), pressure_file_key(target)),
                title: format!("{} vs Speed (Δp ≈ {:.1} MPa)", metric.label(), target),
                x_label: SPEED_LABEL.to_string(),
                y_label: metric.label().to_string(),
                curves,
            });
        }
    }

    charts
}

fn pivot_or_skip(disp: i64, group: &[MeasurementRecord], metric: Metric) -> Option<Pivot> {
    match build_plottable_pivot(group, metric) {
        Ok(pivot) => Some(pivot),
        Err(e) => {
            info!("Skipping {} map for {} cc/rev: {}", metric.column(), disp, e);
            None
        }
    }
}

/// Per displacement and metric: evenly levelled contour of the mean pivot.
pub fn contour_charts(records: &[MeasurementRecord], render: &RenderConfig) -> Vec<ContourChart> {
    let groups: Vec<(i64, Vec<MeasurementRecord>)> = group_by_displacement(records).into_iter().collect();

    groups
        .par_iter()
        .flat_map_iter(|(disp, group)| {
            Metric::ALL.into_iter().filter_map(move |metric| {
                let pivot = pivot_or_skip(*disp, group, metric)?;
                let (min, max) = pivot.value_range()?;
                Some(ContourChart {
                    file_name: format!("{}_contour_disp_{}.png", metric.file_key(), disp),
                    title: format!("{} Contour (Displacement = {} cc/rev)", metric.label(), disp),
                    x_label: "Δp [MPa]".to_string(),
                    y_label: SPEED_LABEL.to_string(),
                    colorbar_label: metric.label().to_string(),
                    levels: contour_levels(min, max, render.contour_levels),
                    pivot,
                    color_scale: ColorScale::Viridis,
                    label_levels: false,
                })
            })
        })
        .collect()
}

/// Per displacement: overall efficiency map with fixed-step labelled levels.
pub fn efficiency_field_charts(records: &[MeasurementRecord], render: &RenderConfig) -> Vec<ContourChart> {
    let groups: Vec<(i64, Vec<MeasurementRecord>)> = group_by_displacement(records).into_iter().collect();

    groups
        .par_iter()
        .filter_map(|(disp, group)| {
            let pivot = pivot_or_skip(*disp, group, Metric::Etat)?;
            let (min, max) = pivot.value_range()?;
            Some(ContourChart {
                file_name: format!("efficiency_map_disp_{}.png", disp),
                title: format!("Total Efficiency Map (Displacement = {} cc/rev)", disp),
                x_label: "Pressure difference Δp [MPa]".to_string(),
                y_label: SPEED_LABEL.to_string(),
                colorbar_label: "Total Efficiency [%]".to_string(),
                levels: stepped_levels(min, max, render.field_level_step),
                pivot,
                color_scale: ColorScale::Inferno,
                label_levels: true,
            })
        })
        .collect()
}
