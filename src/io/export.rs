//! CSV exports: the verification table and synthetic datasets.
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::domain::{Observation, SampleRow};
use crate::error::AppError;

/// Write the `t,x_pred,y_pred` verification table.
pub fn write_samples_csv(path: &Path, rows: &[SampleRow]) -> Result<(), AppError> {
    write_rows(path, rows, "sample CSV")
}

/// Write observations as an `x,y` CSV (same schema the ingest reads).
pub fn write_observations_csv(path: &Path, observations: &[Observation]) -> Result<(), AppError> {
    write_rows(path, observations, "observation CSV")
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T], what: &str) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create {what} '{}': {e}", path.display())))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::input(format!("Failed to write {what} row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush {what} '{}': {e}", path.display())))?;
    Ok(())
}
