//! Data writers for JSON and CSV formats.
//!
//! This module provides functions for writing planner output:
//! - Pretty-printed JSON (raw Overpass responses, GeoJSON, evaluation reports)
//! - CSV with one classified configuration per row

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use super::loaders::Scenario;
use super::model::{Evaluation, RadioConfig};

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

    /// JSON serialization error.
    #[error("JSON write error for '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Mismatched array lengths.
    #[error("length mismatch: {scenarios_len} scenarios but {configs_len} configs")]
    LengthMismatch {
        scenarios_len: usize,
        configs_len: usize,
    },
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

/// Write any serializable value as pretty-printed JSON.
///
/// Non-ASCII characters (street names, area names) are written as-is.
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
/// - The value fails to serialize
///
/// # Example
///
/// ```no_run
/// use numerology_planner::core::writers::write_json;
/// use std::path::Path;
///
/// let value = serde_json::json!({"elements": []});
/// write_json(Path::new("output/roads.json"), &value).unwrap();
/// ```
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| WriteError::JsonError {
        path: path_str.clone(),
        source: e,
    })?;
    writeln!(writer).map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })?;

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write an evaluation report as JSON.
pub fn write_evaluation_json(path: &Path, evaluation: &Evaluation) -> Result<()> {
    write_json(path, evaluation)
}

/// Write classified scenarios to CSV.
///
/// Creates a CSV file with the header
/// `avg_speed,population_density,avg_floors,area_type,frequency,subcarrier,cyclic_prefix`
/// and one row per scenario.
///
/// # Errors
///
/// Returns an error if:
/// - `scenarios` and `configs` have different lengths
/// - Parent directories cannot be created
/// - File cannot be created or written to
pub fn write_configs_csv(path: &Path, scenarios: &[Scenario], configs: &[RadioConfig]) -> Result<()> {
    if scenarios.len() != configs.len() {
        return Err(WriteError::LengthMismatch {
            scenarios_len: scenarios.len(),
            configs_len: configs.len(),
        });
    }

    ensure_parent_dirs(path)?;

    let buf_writer = create_buffered_writer(path)?;
    let mut csv_writer = csv::Writer::from_writer(buf_writer);

    let path_str = path.display().to_string();

    csv_writer
        .write_record([
            "avg_speed",
            "population_density",
            "avg_floors",
            "area_type",
            "frequency",
            "subcarrier",
            "cyclic_prefix",
        ])
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for (scenario, config) in scenarios.iter().zip(configs.iter()) {
        csv_writer
            .write_record(&[
                scenario.avg_speed.to_string(),
                scenario.population_density.to_string(),
                scenario.avg_floors.to_string(),
                config.area_type.to_string(),
                config.frequency.to_string(),
                config.subcarrier.to_string(),
                config.cyclic_prefix.to_string(),
            ])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
