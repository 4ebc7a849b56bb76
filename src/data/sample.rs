//! Synthetic observation generation from known curve parameters.
//!
//! Points are placed on the same evenly spaced `t` grid the fitter assumes, then
//! perturbed with Gaussian noise and occasional outlier jumps. Useful for
//! checking that a fit recovers known parameters.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Observation, SynthConfig};
use crate::error::AppError;
use crate::math::{linspace, validate_range};
use crate::models::predict;

/// Generated observations plus the noise-free curve they were drawn from.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub observations: Vec<Observation>,
    pub baseline: Vec<Observation>,
    /// Indices of points displaced as outliers.
    pub outliers: Vec<usize>,
}

pub fn generate_sample(config: &SynthConfig) -> Result<SampleData, AppError> {
    if config.n_points == 0 {
        return Err(AppError::input("Sample count must be > 0."));
    }
    validate_range(config.grid_start, config.grid_end)?;
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(AppError::input("Noise standard deviation must be finite and >= 0."));
    }
    if !(0.0..1.0).contains(&config.outlier_prob) {
        return Err(AppError::input("Outlier probability must be within [0, 1)."));
    }
    if !(config.outlier_k.is_finite() && config.outlier_k > 0.0) {
        return Err(AppError::input("Outlier magnitude must be finite and > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let ts = linspace(config.grid_start, config.grid_end, config.n_points);
    let (xs, ys) = predict(&ts, &config.params);

    let mut observations = Vec::with_capacity(config.n_points);
    let mut baseline = Vec::with_capacity(config.n_points);
    let mut outliers = Vec::new();

    // Outliers stand out from the noise floor even on noise-free data.
    let jump_scale = config.outlier_k * config.noise_sd.max(1.0);

    for (i, (x, y)) in xs.into_iter().zip(ys).enumerate() {
        baseline.push(Observation::new(x, y));

        let mut dx = config.noise_sd * normal.sample(&mut rng);
        let mut dy = config.noise_sd * normal.sample(&mut rng);

        let roll: f64 = rng.r#gen();
        if roll < config.outlier_prob {
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            dx += jump_scale * angle.cos();
            dy += jump_scale * angle.sin();
            outliers.push(i);
        }

        observations.push(Observation::new(x + dx, y + dy));
    }

    Ok(SampleData {
        observations,
        baseline,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::CurveParams;

    fn config() -> SynthConfig {
        SynthConfig {
            output_path: PathBuf::from("unused.csv"),
            n_points: 50,
            params: CurveParams::new(0.3, 0.01, 10.0),
            grid_start: 6.0,
            grid_end: 60.0,
            noise_sd: 0.0,
            outlier_prob: 0.0,
            outlier_k: 10.0,
            seed: 42,
        }
    }

    #[test]
    fn noise_free_sample_lies_on_the_curve() {
        let data = generate_sample(&config()).unwrap();
        assert_eq!(data.observations.len(), 50);
        assert_eq!(data.observations, data.baseline);
        assert!(data.outliers.is_empty());
    }

    #[test]
    fn same_seed_same_sample() {
        let cfg = SynthConfig { noise_sd: 0.5, outlier_prob: 0.1, ..config() };
        let a = generate_sample(&cfg).unwrap();
        let b = generate_sample(&cfg).unwrap();
        assert_eq!(a.observations, b.observations);
        assert_eq!(a.outliers, b.outliers);
    }

    #[test]
    fn outliers_are_displaced_by_the_jump() {
        let cfg = SynthConfig { outlier_prob: 0.5, outlier_k: 20.0, ..config() };
        let data = generate_sample(&cfg).unwrap();
        assert!(!data.outliers.is_empty());
        for &i in &data.outliers {
            let o = data.observations[i];
            let b = data.baseline[i];
            let dist = ((o.x - b.x).powi(2) + (o.y - b.y).powi(2)).sqrt();
            assert!((dist - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(generate_sample(&SynthConfig { n_points: 0, ..config() }).is_err());
        assert!(generate_sample(&SynthConfig { noise_sd: -1.0, ..config() }).is_err());
        assert!(generate_sample(&SynthConfig { outlier_prob: 1.0, ..config() }).is_err());
    }
}
