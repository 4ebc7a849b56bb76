//! CSV ingest and validation.
//!
//! This module is responsible for turning an `x,y` CSV into a clean list of
//! observations that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Strict rows**: the first malformed value aborts the run with its line number
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::domain::Observation;
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 2] = ["x", "y"];

/// Summary stats about the loaded observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Ingest output: observations in file order + stats.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub stats: DatasetStats,
}

/// Load observations from a CSV file with `x` and `y` columns.
pub fn load_observations(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_observations(file)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {}", path.display(), e.message())))?;
    info!(path = %path.display(), n_points = data.stats.n_points, "loaded observations");
    Ok(data)
}

/// Parse observations from any CSV source.
pub fn read_observations<R: Read>(source: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut observations = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::input(format!("CSV parse error on line {line}: {e}")))?;
        let x = parse_value(&record, &header_map, "x").map_err(|e| AppError::input(format!("Line {line}: {e}")))?;
        let y = parse_value(&record, &header_map, "y").map_err(|e| AppError::input(format!("Line {line}: {e}")))?;
        observations.push(Observation::new(x, y));
    }

    let stats = compute_stats(&observations)
        .ok_or_else(|| AppError::new(3, "No observations found in CSV."))?;

    Ok(IngestedData { observations, stats })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::input(format!("Missing required column: `{name}`")));
        }
    }
    Ok(())
}

fn parse_value(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<f64, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    let raw = record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))?;
    let v = raw
        .parse::<f64>()
        .map_err(|_| format!("Invalid number for `{name}`: '{raw}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value for `{name}`: '{raw}'"))
    }
}

fn compute_stats(observations: &[Observation]) -> Option<DatasetStats> {
    if observations.is_empty() {
        return None;
    }
    let mut stats = DatasetStats {
        n_points: observations.len(),
        x_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_min: f64::INFINITY,
        y_max: f64::NEG_INFINITY,
    };
    for o in observations {
        stats.x_min = stats.x_min.min(o.x);
        stats.x_max = stats.x_max.max(o.x);
        stats.y_min = stats.y_min.min(o.y);
        stats.y_max = stats.y_max.max(o.y);
    }
    Some(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_columns_in_any_order() {
        let csv = "id,y,x\n1,42.5,10.0\n2,43.0,11.5\n";
        let data = read_observations(csv.as_bytes()).unwrap();
        assert_eq!(
            data.observations,
            vec![Observation::new(10.0, 42.5), Observation::new(11.5, 43.0)]
        );
        assert_eq!(data.stats.n_points, 2);
        assert_eq!(data.stats.x_max, 11.5);
        assert_eq!(data.stats.y_min, 42.5);
    }

    #[test]
    fn tolerates_bom_case_and_whitespace() {
        let csv = "\u{feff}X , Y\n 1.0 , 2.0 \n";
        let data = read_observations(csv.as_bytes()).unwrap();
        assert_eq!(data.observations, vec![Observation::new(1.0, 2.0)]);
    }

    #[test]
    fn missing_y_column_is_an_input_error() {
        let err = read_observations("x,z\n1,2\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`y`"), "{err}");
    }

    #[test]
    fn bad_value_reports_line_number() {
        let err = read_observations("x,y\n1,2\n3,abc\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Line 3"), "{err}");
    }

    #[test]
    fn rejects_non_finite_and_blank_values() {
        assert!(read_observations("x,y\n1,inf\n".as_bytes()).is_err());
        assert!(read_observations("x,y\n,2\n".as_bytes()).is_err());
    }

    #[test]
    fn header_only_file_has_no_observations() {
        let err = read_observations("x,y\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
