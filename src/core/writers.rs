//! Data writers for measurement CSV files.
//!
//! This module provides functions for:
//! - Writing measurement records to CSV with the canonical header
//! - Converting the legacy plain-text export to CSV row by row

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use thiserror::Error;

use super::loaders::{MeasurementRecord, REQUIRED_COLUMNS};

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a source file for reading.
    #[error("failed to open file '{path}': {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reading or writing error.
    #[error("CSV error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// CSV error on a writer with no associated path.
    #[error("CSV write error: {0}")]
    Stream(#[from] csv::Error),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Write measurement records as CSV to any writer.
///
/// Values use Rust's shortest round-trip formatting, so reading the output
/// back reproduces every `f64` bit for bit.
pub fn write_measurements<W: Write>(sink: W, records: &[MeasurementRecord]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(sink);

    csv_writer.write_record(REQUIRED_COLUMNS)?;

    for record in records {
        csv_writer.write_record(record.fields().iter().map(|v| v.to_string()))?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write measurement records to a CSV file.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `records` - Records to write, in order
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
pub fn write_measurements_csv(path: &Path, records: &[MeasurementRecord]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let writer = create_buffered_writer(path)?;

    write_measurements(writer, records).map_err(|e| match e {
        WriteError::Stream(source) => WriteError::CsvError {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Convert the legacy plain-text export to CSV.
///
/// Every row, header included, is copied field for field with no
/// reordering or transformation. Line endings are normalized to `\n` and
/// fields are re-quoted only where CSV requires it.
///
/// # Arguments
///
/// * `input` - Legacy text file
/// * `output` - CSV file to create (parent directories will be created if needed)
/// * `delimiter` - Field delimiter of the legacy file
///
/// # Returns
///
/// The number of rows written, including the header row.
pub fn convert_legacy_text(input: &Path, output: &Path, delimiter: u8) -> Result<usize> {
    let in_str = input.display().to_string();
    let out_str = output.display().to_string();

    let source = File::open(input).map_err(|e| WriteError::OpenFile {
        path: in_str.clone(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(BufReader::new(source));

    ensure_parent_dirs(output)?;
    let sink = create_buffered_writer(output)?;
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(sink);

    let mut rows = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| WriteError::CsvError {
            path: in_str.clone(),
            source: e,
        })?;
        writer.write_record(&record).map_err(|e| WriteError::CsvError {
            path: out_str.clone(),
            source: e,
        })?;
        rows += 1;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: out_str,
        source: e,
    })?;

    Ok(rows)
}
