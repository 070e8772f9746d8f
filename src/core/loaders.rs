//! Data loaders for pump efficiency measurement files.
//!
//! This module provides parsers for:
//! - Comma-separated measurement files with a header row
//! - The legacy plain-text export, which carries the same columns

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::InputConfig;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error at row {row}, column '{column}': '{value}' is not a finite number")]
    Parse {
        row: u64,
        column: String,
        value: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Input format detection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Legacy plain-text export with the same columns
    LegacyText,
}

/// Columns every measurement file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Speed", "Displacement", "Deltap", "Etat", "Etav", "Etam"];

/// Efficiency metric carried by each measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Overall efficiency
    Etat,
    /// Volumetric efficiency
    Etav,
    /// Hydromechanical efficiency
    Etam,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Etat, Metric::Etav, Metric::Etam];

    /// Column name in the input file.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Etat => "Etat",
            Metric::Etav => "Etav",
            Metric::Etam => "Etam",
        }
    }

    /// Lowercase key used in output file names.
    pub fn file_key(self) -> &'static str {
        match self {
            Metric::Etat => "etat",
            Metric::Etav => "etav",
            Metric::Etam => "etam",
        }
    }

    /// Axis label with unit.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Etat => "Overall Efficiency (Etat) [%]",
            Metric::Etav => "Volumetric Efficiency (Etav) [%]",
            Metric::Etam => "Hydromechanical Efficiency (Etam) [%]",
        }
    }
}

/// One row of a pump efficiency test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRecord {
    /// Rotational speed [RPM]
    pub speed: f64,
    /// Geometric displacement [cc/rev]
    pub displacement: f64,
    /// Pressure difference across the pump [MPa]
    pub deltap: f64,
    /// Overall efficiency [%]
    pub etat: f64,
    /// Volumetric efficiency [%]
    pub etav: f64,
    /// Hydromechanical efficiency [%]
    pub etam: f64,
}

impl MeasurementRecord {
    /// Value of the given efficiency metric.
    #[inline]
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Etat => self.etat,
            Metric::Etav => self.etav,
            Metric::Etam => self.etam,
        }
    }

    /// Fields in `REQUIRED_COLUMNS` order.
    pub fn fields(&self) -> [f64; 6] {
        [
            self.speed,
            self.displacement,
            self.deltap,
            self.etat,
            self.etav,
            self.etam,
        ]
    }

    fn from_fields(fields: [f64; 6]) -> Self {
        let [speed, displacement, deltap, etat, etav, etam] = fields;
        Self {
            speed,
            displacement,
            deltap,
            etat,
            etav,
            etam,
        }
    }
}

/// Read measurement records from any delimited source with a header row.
///
/// Required columns are matched case-insensitively; extra columns are
/// ignored. Every required field must parse as a finite `f64`, otherwise
/// the whole read fails with [`LoaderError::Parse`]. Rows are returned in
/// source order with no filtering or deduplication.
pub fn read_measurements<R: Read>(source: R, delimiter: u8) -> Result<Vec<MeasurementRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let col_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    let mut indices = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        match col_map.get(&column.to_lowercase()) {
            Some(&idx) => *slot = idx,
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns(missing.join(", ")));
    }

    let mut records = Vec::with_capacity(1024);

    for result in reader.records() {
        let record = result?;
        let row = record.position().map_or(0, |pos| pos.line());

        let mut fields = [0.0f64; 6];
        for ((field, &idx), column) in fields.iter_mut().zip(&indices).zip(REQUIRED_COLUMNS) {
            let raw = record.get(idx).unwrap_or("");
            *field = match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    return Err(LoaderError::Parse {
                        row,
                        column: column.to_string(),
                        value: raw.to_string(),
                    })
                }
            };
        }

        records.push(MeasurementRecord::from_fields(fields));
    }

    Ok(records)
}

/// Load measurement records from a CSV or legacy text file.
///
/// # Arguments
///
/// * `path` - Path to the measurement file
/// * `config` - Input configuration (uses defaults if None)
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks required columns,
/// contains a non-numeric field, or has no data rows.
pub fn load_measurements<P: AsRef<Path>>(
    path: P,
    config: Option<&InputConfig>,
) -> Result<Vec<MeasurementRecord>> {
    let path = path.as_ref();
    let default_config = InputConfig::default();
    let config = config.unwrap_or(&default_config);

    let delimiter = match detect_input_format(path) {
        InputFormat::Csv => b',',
        InputFormat::LegacyText => config.legacy_delimiter_byte(),
    };

    let file = File::open(path)?;
    let records = read_measurements(BufReader::new(file), delimiter)?;

    if records.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(records)
}

/// Stable ascending sort by (Speed, Displacement, Deltap) on raw values.
pub fn sort_records(records: &mut [MeasurementRecord]) {
    records.sort_by(|a, b| {
        a.speed
            .total_cmp(&b.speed)
            .then(a.displacement.total_cmp(&b.displacement))
            .then(a.deltap.total_cmp(&b.deltap))
    });
}

/// Detect whether a file is CSV or the legacy text export.
///
/// Detection is based on the extension: `.csv` (any case) is CSV,
/// everything else is treated as legacy text.
pub fn detect_input_format<P: AsRef<Path>>(path: P) -> InputFormat {
    let is_csv = path
        .as_ref()
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        InputFormat::Csv
    } else {
        InputFormat::LegacyText
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    const HEADER: &str = "Speed,Displacement,Deltap,Etat,Etav,Etam";

    fn rec(speed: f64, displacement: f64, deltap: f64, etat: f64) -> MeasurementRecord {
        MeasurementRecord {
            speed,
            displacement,
            deltap,
            etat,
            etav: 95.0,
            etam: 94.0,
        }
    }

    #[test]
    fn test_read_measurements_in_file_order() -> Result<()> {
        let data = format!("{}\n1500,32.4,7.96,90.1,95,94\n1000,32.6,8.04,91.3,96,95\n", HEADER);
        let records = read_measurements(data.as_bytes(), b',')?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].speed, 1500.0);
        assert_eq!(records[0].displacement, 32.4);
        assert_eq!(records[1].deltap, 8.04);
        assert_eq!(records[1].etat, 91.3);

        Ok(())
    }

    #[test]
    fn test_extra_columns_and_header_case_are_tolerated() -> Result<()> {
        let data = "Time,etam,ETAV,Etat,Deltap,Displacement,speed,Note\n\
                    0.5,94,95,90,8.0,32,1000,steady\n";
        let records = read_measurements(data.as_bytes(), b',')?;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].speed, 1000.0);
        assert_eq!(records[0].displacement, 32.0);
        assert_eq!(records[0].etam, 94.0);
        assert_eq!(records[0].etav, 95.0);

        Ok(())
    }

    #[test]
    fn test_missing_columns_are_named() {
        let data = "Speed,Displacement,Deltap,Etat\n1000,32,8,90\n";
        let err = read_measurements(data.as_bytes(), b',').unwrap_err();
        match err {
            LoaderError::MissingColumns(cols) => assert_eq!(cols, "Etav, Etam"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_error_names_row_and_column() {
        let data = format!("{}\n1000,32,8,90,95,94\n1200,32,abc,90,95,94\n", HEADER);
        let err = read_measurements(data.as_bytes(), b',').unwrap_err();
        match err {
            LoaderError::Parse { row, column, value } => {
                assert_eq!(row, 3);
                assert_eq!(column, "Deltap");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let data = format!("{}\n1000,32,8,NaN,95,94\n", HEADER);
        let err = read_measurements(data.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, LoaderError::Parse { ref column, .. } if column == "Etat"));
    }

    #[test]
    fn test_load_measurements_legacy_text_with_tabs() -> Result<()> {
        let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Speed\tDisplacement\tDeltap\tEtat\tEtav\tEtam\r\n").unwrap();
        write!(file, "1000\t32\t8\t90\t95\t94\r\n").unwrap();
        file.flush().unwrap();

        let config = InputConfig {
            legacy_delimiter: '\t',
            ..InputConfig::default()
        };
        let records = load_measurements(file.path(), Some(&config))?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].etam, 94.0);

        Ok(())
    }

    #[test]
    fn test_load_measurements_header_only_is_empty_file() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        file.flush().unwrap();

        let err = load_measurements(file.path(), None).unwrap_err();
        assert!(matches!(err, LoaderError::EmptyFile(_)));
    }

    #[test]
    fn test_sort_records_is_stable_on_full_ties() {
        let mut records = vec![
            rec(1200.0, 32.0, 8.0, 1.0),
            rec(1000.0, 45.0, 8.0, 2.0),
            rec(1000.0, 32.0, 9.0, 3.0),
            rec(1000.0, 32.0, 8.0, 4.0),
            rec(1000.0, 32.0, 8.0, 5.0),
        ];
        sort_records(&mut records);

        let order: Vec<f64> = records.iter().map(|r| r.etat).collect();
        assert_eq!(order, vec![4.0, 5.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_detect_input_format() {
        assert_eq!(detect_input_format("data.csv"), InputFormat::Csv);
        assert_eq!(detect_input_format("DATA.CSV"), InputFormat::Csv);
        assert_eq!(
            detect_input_format("V32HL56-efficiency test.txt"),
            InputFormat::LegacyText
        );
        assert_eq!(detect_input_format("noext"), InputFormat::LegacyText);
    }

    #[test]
    fn test_metric_accessors() {
        let r = MeasurementRecord {
            speed: 1.0,
            displacement: 2.0,
            deltap: 3.0,
            etat: 4.0,
            etav: 5.0,
            etam: 6.0,
        };
        assert_eq!(r.metric(Metric::Etat), 4.0);
        assert_eq!(r.metric(Metric::Etav), 5.0);
        assert_eq!(r.metric(Metric::Etam), 6.0);
        assert_eq!(r.fields(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(Metric::Etav.file_key(), "etav");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("missing.csv");
        let err = load_measurements(&path, None).unwrap_err();
        assert!(matches!(err, LoaderError::Io(_)));
    }
}
