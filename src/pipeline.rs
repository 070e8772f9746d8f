//! End-to-end run: load, plan and render every configured plot family.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::core::loaders::{load_measurements, sort_records, MeasurementRecord};
use crate::processors::charts::{
    contour_charts, displacement_curve_charts, efficiency_field_charts, pressure_curve_charts,
    ContourChart, LineChart,
};
use crate::visualization::{render_contour_chart, render_line_chart};

/// The chart families a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotFamily {
    /// Efficiency vs speed per displacement, one curve per pressure
    PressureCurves,
    /// Efficiency vs speed per target pressure, one curve per displacement
    DisplacementCurves,
    /// Contour of each efficiency over pressure and speed
    Contours,
    /// Overall efficiency map with labelled fixed-step levels
    EfficiencyFields,
}

impl PlotFamily {
    pub const ALL: [PlotFamily; 4] = [
        PlotFamily::PressureCurves,
        PlotFamily::DisplacementCurves,
        PlotFamily::Contours,
        PlotFamily::EfficiencyFields,
    ];
}

/// A chart of either kind, tagged with its family.
#[derive(Debug, Clone)]
pub enum PlannedChart {
    Line(PlotFamily, LineChart),
    Contour(PlotFamily, ContourChart),
}

impl PlannedChart {
    pub fn family(&self) -> PlotFamily {
        match self {
            PlannedChart::Line(family, _) | PlannedChart::Contour(family, _) => *family,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            PlannedChart::Line(_, chart) => &chart.file_name,
            PlannedChart::Contour(_, chart) => &chart.file_name,
        }
    }
}

/// Every chart a run will write, in deterministic order.
#[derive(Debug, Clone, Default)]
pub struct ChartPlan {
    pub charts: Vec<PlannedChart>,
}

impl ChartPlan {
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Number of planned charts in one family.
    pub fn count(&self, family: PlotFamily) -> usize {
        self.charts.iter().filter(|c| c.family() == family).count()
    }

    /// Output path of every planned chart.
    pub fn output_paths(&self, config: &PipelineConfig) -> Vec<PathBuf> {
        self.charts
            .iter()
            .map(|c| config.output.dir_for(c.family()).join(c.file_name()))
            .collect()
    }
}

/// Outcome of rendering a plan.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Outcome of a full run.
#[derive(Debug)]
pub struct RunSummary {
    pub records: usize,
    pub planned: usize,
    pub report: RenderReport,
}

/// Build the charts of every configured family. Touches no files.
///
/// Families listed more than once are planned once. A chart whose output
/// path is already taken by an earlier chart is dropped with a warning, so
/// no two planned charts ever write the same file.
pub fn plan_charts(records: &[MeasurementRecord], config: &PipelineConfig) -> ChartPlan {
    let mut families: Vec<PlotFamily> = Vec::new();
    for &family in &config.render.families {
        if !families.contains(&family) {
            families.push(family);
        }
    }

    let mut candidates = Vec::new();
    for family in families {
        let before = candidates.len();
        match family {
            PlotFamily::PressureCurves => candidates.extend(
                pressure_curve_charts(records, &config.grouping)
                    .into_iter()
                    .map(|c| PlannedChart::Line(family, c)),
            ),
            PlotFamily::DisplacementCurves => candidates.extend(
                displacement_curve_charts(records, &config.grouping)
                    .into_iter()
                    .map(|c| PlannedChart::Line(family, c)),
            ),
            PlotFamily::Contours => candidates.extend(
                contour_charts(records, &config.render)
                    .into_iter()
                    .map(|c| PlannedChart::Contour(family, c)),
            ),
            PlotFamily::EfficiencyFields => candidates.extend(
                efficiency_field_charts(records, &config.render)
                    .into_iter()
                    .map(|c| PlannedChart::Contour(family, c)),
            ),
        }
        info!("{:?}: {} charts planned", family, candidates.len() - before);
    }

    let mut taken = HashSet::new();
    let mut plan = ChartPlan::default();
    for chart in candidates {
        let path = config.output.dir_for(chart.family()).join(chart.file_name());
        if taken.insert(path.clone()) {
            plan.charts.push(chart);
        } else {
            warn!("Skipping {:?} chart: {} is already planned", chart.family(), path.display());
        }
    }

    plan
}

/// Render every chart of a plan into its family directory.
///
/// Directories are created as needed. A chart that fails to render is
/// recorded in the report and does not stop the others.
pub fn render_plan(plan: &ChartPlan, config: &PipelineConfig) -> Result<RenderReport> {
    let dirs: BTreeSet<PathBuf> = plan
        .charts
        .iter()
        .map(|c| config.output.dir_for(c.family()))
        .collect();
    for dir in dirs {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let size = (config.output.width, config.output.height);
    let outcomes: Vec<(PathBuf, std::result::Result<(), String>)> = plan
        .charts
        .par_iter()
        .map(|chart| {
            let path = config.output.dir_for(chart.family()).join(chart.file_name());
            let outcome = match chart {
                PlannedChart::Line(_, line) => render_line_chart(&path, line, size),
                PlannedChart::Contour(_, contour) => render_contour_chart(&path, contour, size),
            };
            (path, outcome.map_err(|e| e.to_string()))
        })
        .collect();

    let mut report = RenderReport::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                error!("Failed to render {}: {}", path.display(), e);
                report.failed.push((path, e));
            }
        }
    }

    Ok(report)
}

/// Load the measurements used by a run, sorting them when configured.
pub fn load_records(input: &Path, config: &PipelineConfig) -> Result<Vec<MeasurementRecord>> {
    let mut records = load_measurements(input, Some(&config.input))
        .with_context(|| format!("Failed to load measurements from {}", input.display()))?;

    if config.input.sort_rows {
        sort_records(&mut records);
    }
    info!("Loaded {} records from {}", records.len(), input.display());

    Ok(records)
}

/// Load, plan and render.
pub fn run(input: &Path, config: &PipelineConfig) -> Result<RunSummary> {
    let records = load_records(input, config)?;
    let plan = plan_charts(&records, config);
    let report = render_plan(&plan, config)?;

    Ok(RunSummary {
        records: records.len(),
        planned: plan.len(),
        report,
    })
}
