//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place keeps the core workflow testable without the CLI:
//! ingest -> fit -> verification samples -> output CSV -> residuals
//!
//! The output CSV is written only once a fit has succeeded.

use tracing::info;

use crate::domain::{FitConfig, FitResult, PointResidual, SampleRow};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::math::linspace;

/// All computed outputs of a single `spiral fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    /// The `t` grid assigned to the observations.
    pub ts: Vec<f64>,
    pub fit: FitResult,
    pub residuals: Vec<PointResidual>,
    pub worst: Vec<PointResidual>,
    pub samples: Vec<SampleRow>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = crate::io::load_observations(&config.input_path)?;
    info!(
        path = %config.input_path.display(),
        n_points = ingest.stats.n_points,
        "loaded observations"
    );

    run_fit_with_data(config, ingest)
}

/// Execute the pipeline on already-ingested observations.
pub fn run_fit_with_data(config: &FitConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    let fit = crate::fit::fit_curve(&ingest.observations, config)?;

    let samples = crate::report::sample_curve(
        &fit.params,
        config.grid_start,
        config.grid_end,
        config.sample_count,
    );
    crate::io::write_samples_csv(&config.output_path, &samples)?;
    info!(path = %config.output_path.display(), rows = samples.len(), "wrote verification rows");

    let ts = linspace(config.grid_start, config.grid_end, ingest.observations.len());
    let residuals = crate::report::compute_residuals(&ingest.observations, &ts, &fit);
    let worst = crate::report::worst_points(&residuals, config.top_n);

    Ok(RunOutput {
        ingest,
        ts,
        fit,
        residuals,
        worst,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::domain::{CurveParams, Observation};
    use crate::models::predict;

    fn write_exact_dataset(path: &std::path::Path) {
        let params = CurveParams::new(0.3, 0.01, 10.0);
        let ts = linspace(6.0, 60.0, 50);
        let (xs, ys) = predict(&ts, &params);
        let obs: Vec<Observation> = xs.into_iter().zip(ys).map(|(x, y)| Observation::new(x, y)).collect();
        crate::io::write_observations_csv(path, &obs).unwrap();
    }

    fn config_for(dir: &std::path::Path) -> FitConfig {
        FitConfig {
            input_path: dir.join("xy_data.csv"),
            output_path: dir.join("fitted_points.csv"),
            seed: Some(42),
            abs_tolerance: 1e-10,
            allow_unconverged: true,
            ..FitConfig::default()
        }
    }

    #[test]
    fn end_to_end_writes_verification_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        write_exact_dataset(&config.input_path);

        let run = run_fit(&config).unwrap();
        assert!((run.fit.params.theta - 0.3).abs() < 1e-3);
        assert_eq!(run.samples.len(), 10);
        assert_eq!(run.ts.len(), 50);
        assert_eq!(run.worst.len(), 5);

        let written = fs::read_to_string(&config.output_path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("t,x_pred,y_pred"));
        assert_eq!(lines.count(), 10);
    }

    #[test]
    fn missing_y_column_is_an_input_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        fs::write(&config.input_path, "x,z\n1.0,2.0\n3.0,4.0\n").unwrap();

        let err = run_fit(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(!config.output_path.exists());
    }

    #[test]
    fn failed_fit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = FitConfig {
            allow_unconverged: false,
            max_generations: 1,
            ..config_for(dir.path())
        };
        write_exact_dataset(&config.input_path);

        let err = run_fit(&config).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(!config.output_path.exists());
    }
}
