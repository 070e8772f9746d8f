//! PNG rendering of planned charts.
//!
//! Line charts are drawn as one coloured line per curve with a legend.
//! Contour charts are drawn as filled cells around each pivot grid point,
//! coloured by the level band the cell value falls in, next to a colour bar.
//! Efficiency maps additionally get black iso-lines labelled with their level.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::processors::charts::{ColorScale, ContourChart, LineChart};
use crate::processors::isolines::iso_lines;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Chart has no data: {0}")]
    EmptyChart(String),
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Width in pixels reserved for the colour bar of contour charts.
const COLORBAR_WIDTH: i32 = 130;

const CAPTION_FONT: (&str, i32) = ("sans-serif", 18);

const ISO_LABEL_FONT: (&str, i32) = ("sans-serif", 12);

/// Color palette for curves.
const CURVE_COLORS: &[(u8, u8, u8)] = &[
    (31, 119, 180),  // Blue
    (255, 127, 14),  // Orange
    (44, 160, 44),   // Green
    (214, 39, 40),   // Red
    (148, 103, 189), // Purple
    (140, 86, 75),   // Brown
    (227, 119, 194), // Pink
    (127, 127, 127), // Gray
    (188, 189, 34),  // Olive
    (23, 190, 207),  // Cyan
];

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

fn curve_color(index: usize) -> RGBColor {
    let c = CURVE_COLORS[index % CURVE_COLORS.len()];
    RGBColor(c.0, c.1, c.2)
}

/// Compute padded (x_min, x_max, y_min, y_max) over all curve points.
fn line_bounds(chart: &LineChart) -> Option<(f64, f64, f64, f64)> {
    let mut points = chart.curves.iter().flat_map(|c| c.series.points.iter());
    let &(x0, y0) = points.next()?;

    let (mut x_min, mut x_max, mut y_min, mut y_max) = (x0, x0, y0, y0);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let y_padding = (y_max - y_min) * 0.05;
    Some((x_min, x_max, y_min - y_padding, y_max + y_padding))
}

/// Cell boundaries around sorted grid positions.
///
/// Inner boundaries sit halfway between neighbours; the outer ones mirror
/// the nearest inner gap. A single position gets a unit-wide cell.
pub fn cell_edges(centers: &[f64]) -> Vec<f64> {
    match centers.len() {
        0 => Vec::new(),
        1 => vec![centers[0] - 0.5, centers[0] + 0.5],
        n => {
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
            for pair in centers.windows(2) {
                edges.push((pair[0] + pair[1]) / 2.0);
            }
            edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
            edges
        }
    }
}

/// Index of the level band containing `value`.
///
/// Bands lie between consecutive levels; values outside the levels clamp
/// to the first or last band.
pub fn band_index(value: f64, levels: &[f64]) -> usize {
    let bands = levels.len().saturating_sub(1).max(1);
    let above = levels.iter().filter(|&&level| level <= value).count();
    above.saturating_sub(1).min(bands - 1)
}

fn band_color(band: usize, levels: &[f64], scale: ColorScale) -> RGBColor {
    let bands = levels.len().saturating_sub(1).max(1);
    let t = if bands > 1 {
        band as f64 / (bands - 1) as f64
    } else {
        0.5
    };
    let gradient = match scale {
        ColorScale::Viridis => colorous::VIRIDIS,
        ColorScale::Inferno => colorous::INFERNO,
    };
    let color = gradient.eval_continuous(t.clamp(0.0, 1.0));
    RGBColor(color.r, color.g, color.b)
}

/// Render a line chart and save it as PNG.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `chart` - The chart to draw
/// * `size` - Image (width, height) in pixels
pub fn render_line_chart(output_path: &Path, chart: &LineChart, size: (u32, u32)) -> Result<()> {
    let (x_min, x_max, y_min, y_max) =
        line_bounds(chart).ok_or_else(|| VisualizationError::EmptyChart(chart.file_name.clone()))?;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .light_line_style(BLACK.mix(0.05))
        .draw()
        .map_err(plot_err)?;

    for (i, curve) in chart.curves.iter().enumerate() {
        let color = curve_color(i);
        ctx.draw_series(LineSeries::new(
            curve.series.points.iter().copied(),
            color.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label(curve.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;

    Ok(())
}

fn draw_colorbar(area: &DrawingArea<BitMapBackend, Shift>, chart: &ContourChart) -> Result<()> {
    let levels = &chart.levels;
    let (low, high) = match (levels.first(), levels.last()) {
        (Some(&low), Some(&high)) if high > low => (low, high),
        _ => return Ok(()),
    };

    let mut bar = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(50)
        .margin_right(10)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..1f64, low..high)
        .map_err(plot_err)?;

    bar.draw_series(levels.windows(2).enumerate().map(|(band, pair)| {
        let color = band_color(band, levels, chart.color_scale);
        Rectangle::new([(0.0, pair[0]), (1.0, pair[1])], color.filled())
    }))
    .map_err(plot_err)?;

    if chart.label_levels {
        bar.draw_series(levels.iter().map(|&level| {
            PathElement::new(vec![(0.0, level), (1.0, level)], BLACK.stroke_width(1))
        }))
        .map_err(plot_err)?;
    }

    let tick_count = if chart.label_levels { levels.len() } else { 10 };
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(chart.colorbar_label.as_str())
        .y_labels(tick_count)
        .y_label_formatter(&|v| format!("{:.1}", v))
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

/// Render a contour chart and save it as PNG.
///
/// Cells with no data are left blank.
pub fn render_contour_chart(output_path: &Path, chart: &ContourChart, size: (u32, u32)) -> Result<()> {
    let pivot = &chart.pivot;
    let x_edges = cell_edges(&pivot.deltap_values());
    let y_edges = cell_edges(&pivot.speeds);

    let (x_min, x_max, y_min, y_max) = match (x_edges.first(), x_edges.last(), y_edges.first(), y_edges.last()) {
        (Some(&x0), Some(&x1), Some(&y0), Some(&y1)) => (x0, x1, y0, y1),
        _ => return Err(VisualizationError::EmptyChart(chart.file_name.clone())),
    };

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let main_width = (size.0 as i32 - COLORBAR_WIDTH).max(1);
    let (main_area, bar_area) = root.split_horizontally(main_width);

    let mut ctx = ChartBuilder::on(&main_area)
        .caption(&chart.title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    let mut cells = Vec::new();
    for (row, speed_edges) in y_edges.windows(2).enumerate() {
        for (col, dp_edges) in x_edges.windows(2).enumerate() {
            if let Some(value) = pivot.get(row, col) {
                let color = band_color(band_index(value, &chart.levels), &chart.levels, chart.color_scale);
                cells.push(Rectangle::new(
                    [(dp_edges[0], speed_edges[0]), (dp_edges[1], speed_edges[1])],
                    color.filled(),
                ));
            }
        }
    }
    ctx.draw_series(cells).map_err(plot_err)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(WHITE.mix(0.0))
        .draw()
        .map_err(plot_err)?;

    if chart.label_levels {
        for line in iso_lines(pivot, &chart.levels) {
            ctx.draw_series(
                line.segments
                    .iter()
                    .map(|&(a, b)| PathElement::new(vec![a, b], BLACK.stroke_width(1))),
            )
            .map_err(plot_err)?;

            if let Some(anchor) = line.label_anchor() {
                ctx.draw_series(std::iter::once(Text::new(
                    format!("{:.0}", line.level),
                    anchor,
                    ISO_LABEL_FONT.into_font().color(&BLACK),
                )))
                .map_err(plot_err)?;
            }
        }
    }

    draw_colorbar(&bar_area, chart)?;

    root.present().map_err(plot_err)?;

    Ok(())
}
