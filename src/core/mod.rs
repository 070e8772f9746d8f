//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{LoaderError, MeasurementRecord, Metric};
pub use transforms::{normalize, round_deltap, round_displacement, DeltapTenths, RoundedKeys};
pub use writers::{convert_legacy_text, write_measurements, write_measurements_csv, WriteError};
