//! Data processing modules.

pub mod charts;
pub mod grouping;
pub mod isolines;
pub mod pivot;
pub mod series;

// Re-export key types for convenience
pub use charts::{
    contour_charts, contour_levels, displacement_curve_charts, efficiency_field_charts,
    pressure_curve_charts, pressure_file_key, stepped_levels, ColorScale, ContourChart, Curve,
    LineChart,
};
pub use grouping::{
    filter_near_pressure, group_by, group_by_displacement, group_records, select_group,
    Granularity, GroupKey, GroupingError, Groups,
};
pub use isolines::{iso_lines, iso_segments, IsoLine, Segment};
pub use pivot::{build_pivot, build_plottable_pivot, Pivot, PivotError};
pub use series::{build_series, distinct_deltaps, pressure_series, subsample_evenly, Series};
