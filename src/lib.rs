//! Grouping and charting pipeline for hydraulic pump efficiency tests.
//!
//! This crate provides tools for:
//! - Loading measurement CSV files and the legacy text export
//! - Rounding displacement and pressure into grouping keys
//! - Building speed-ordered series and speed × pressure pivots
//! - Rendering line, contour and efficiency-map charts as PNG
//!
//! # Example
//!
//! ```no_run
//! use pump_efficiency::{pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::default();
//! let summary = pipeline::run(Path::new("V32HL56-efficiency.csv"), &config).unwrap();
//! println!("{} charts written", summary.report.written.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod processors;
pub mod visualization;

pub use config::{GroupingConfig, InputConfig, OutputConfig, PipelineConfig, RenderConfig};
pub use core::loaders::{MeasurementRecord, Metric};
pub use pipeline::PlotFamily;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
