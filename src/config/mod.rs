//! Configuration types for the efficiency plotting pipeline.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pipeline::PlotFamily;

/// Configuration for locating and reading the measurement data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV measurement file plotted when no `--input` override is given
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Legacy plain-text export converted by the `convert` command
    #[serde(default = "default_legacy_file")]
    pub legacy_file: PathBuf,

    /// Field delimiter of the legacy text format
    #[serde(default = "default_legacy_delimiter")]
    pub legacy_delimiter: char,

    /// Stable-sort rows by (Speed, Displacement, Deltap) after loading
    #[serde(default = "default_sort_rows")]
    pub sort_rows: bool,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("V32HL56-efficiency.csv")
}

fn default_legacy_file() -> PathBuf {
    PathBuf::from("V32HL56-efficiency test.txt")
}

fn default_legacy_delimiter() -> char {
    ','
}

fn default_sort_rows() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            legacy_file: default_legacy_file(),
            legacy_delimiter: default_legacy_delimiter(),
            sort_rows: default_sort_rows(),
        }
    }
}

impl InputConfig {
    /// Legacy delimiter as a single byte, falling back to a comma for non-ASCII input.
    pub fn legacy_delimiter_byte(&self) -> u8 {
        if self.legacy_delimiter.is_ascii() {
            self.legacy_delimiter as u8
        } else {
            warn!(
                "Legacy delimiter {:?} is not a single-byte character, using ','",
                self.legacy_delimiter
            );
            b','
        }
    }
}

/// Configuration for grouping measurements into plotted series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Upper bound (approximate) on pressure curves per line chart
    #[serde(default = "default_max_curves")]
    pub max_curves: usize,

    /// Pressure differences (MPa) for the per-pressure line charts
    #[serde(default = "default_target_pressures")]
    pub target_pressures: Vec<f64>,

    /// Allowed distance (MPa) between a raw Deltap and a target pressure
    #[serde(default = "default_pressure_tolerance")]
    pub pressure_tolerance: f64,
}

fn default_max_curves() -> usize {
    8
}

fn default_target_pressures() -> Vec<f64> {
    vec![11.0, 32.0, 38.0]
}

fn default_pressure_tolerance() -> f64 {
    0.2
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_curves: default_max_curves(),
            target_pressures: default_target_pressures(),
            pressure_tolerance: default_pressure_tolerance(),
        }
    }
}

/// Configuration for output locations and image size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory all chart directories are created under
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Charts with one curve per pressure, one chart per displacement
    #[serde(default = "default_pressure_curves_dir")]
    pub pressure_curves_dir: String,

    /// Charts with one curve per displacement, one chart per target pressure
    #[serde(default = "default_displacement_curves_dir")]
    pub displacement_curves_dir: String,

    #[serde(default = "default_contours_dir")]
    pub contours_dir: String,

    #[serde(default = "default_fields_dir")]
    pub fields_dir: String,

    /// Image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_pressure_curves_dir() -> String {
    "corrected_plots".to_string()
}

fn default_displacement_curves_dir() -> String {
    "Efficiency_plots".to_string()
}

fn default_contours_dir() -> String {
    "contour_plots".to_string()
}

fn default_fields_dir() -> String {
    "efficiency_fields".to_string()
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            pressure_curves_dir: default_pressure_curves_dir(),
            displacement_curves_dir: default_displacement_curves_dir(),
            contours_dir: default_contours_dir(),
            fields_dir: default_fields_dir(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl OutputConfig {
    /// Resolve the output directory for a plot family.
    pub fn dir_for(&self, family: PlotFamily) -> PathBuf {
        let name = match family {
            PlotFamily::PressureCurves => &self.pressure_curves_dir,
            PlotFamily::DisplacementCurves => &self.displacement_curves_dir,
            PlotFamily::Contours => &self.contours_dir,
            PlotFamily::EfficiencyFields => &self.fields_dir,
        };
        self.root.join(name)
    }
}

/// Configuration for contour rendering and family selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Number of evenly spaced levels in contour charts
    #[serde(default = "default_contour_levels")]
    pub contour_levels: usize,

    /// Level spacing (percentage points) in efficiency field maps
    #[serde(default = "default_field_level_step")]
    pub field_level_step: f64,

    /// Plot families produced by a run
    #[serde(default = "default_families")]
    pub families: Vec<PlotFamily>,
}

fn default_contour_levels() -> usize {
    20
}

fn default_field_level_step() -> f64 {
    2.0
}

fn default_families() -> Vec<PlotFamily> {
    PlotFamily::ALL.to_vec()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            contour_levels: default_contour_levels(),
            field_level_step: default_field_level_step(),
            families: default_families(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub grouping: GroupingConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
