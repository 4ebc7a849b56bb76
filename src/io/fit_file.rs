//! Read/write fit JSON files.
//!
//! Fit JSON is the portable representation of a finished run:
//! - fitted parameters + objective + optimizer statistics
//! - the bounds and grid range the fit was run with
//! - the observations and a densely sampled fitted curve for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{FitConfig, FitFile, FitResult};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::report::sample_curve;

/// Number of curve samples stored for plotting.
pub const CURVE_SAMPLES: usize = 201;

pub fn build_fit_file(fit: &FitResult, ingest: &IngestedData, config: &FitConfig) -> FitFile {
    FitFile {
        tool: "spiral".to_string(),
        generated_at: Utc::now(),
        input: config.input_path.display().to_string(),
        grid_start: config.grid_start,
        grid_end: config.grid_end,
        bounds: config.bounds,
        theta_degrees: fit.params.theta_degrees(),
        result: fit.clone(),
        observations: ingest.observations.clone(),
        curve: sample_curve(&fit.params, config.grid_start, config.grid_end, CURVE_SAMPLES),
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit_file: &FitFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, fit_file)
        .map_err(|e| AppError::input(format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit_file: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid fit JSON: {e}")))?;
    Ok(fit_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveParams, LossKind, Observation};
    use crate::io::ingest::read_observations;

    #[test]
    fn saved_fit_reloads_with_same_parameters() {
        let ingest = read_observations("x,y\n1,42\n2,43\n".as_bytes()).unwrap();
        let fit = FitResult {
            params: CurveParams::new(0.25, -0.01, 12.5),
            objective: 0.125,
            loss: LossKind::L1,
            generations: 17,
            evaluations: 810,
            converged: true,
            polished: false,
            message: "ok".to_string(),
        };
        let config = FitConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");

        write_fit_json(&path, &build_fit_file(&fit, &ingest, &config)).unwrap();
        let loaded = read_fit_json(&path).unwrap();

        let (a, b) = (loaded.result.params.to_array(), fit.params.to_array());
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-12);
        }
        assert_eq!(loaded.result.loss, LossKind::L1);
        assert_eq!(loaded.observations, vec![Observation::new(1.0, 42.0), Observation::new(2.0, 43.0)]);
        assert_eq!(loaded.curve.len(), CURVE_SAMPLES);
        assert_eq!(loaded.curve[0].t, 6.0);
        assert_eq!(loaded.curve[CURVE_SAMPLES - 1].t, 60.0);
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_fit_json(&path).unwrap_err().exit_code(), 2);
    }
}
