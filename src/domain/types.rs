//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to CSV/JSON
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One measured point of the input dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
}

impl Observation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The three fitted curve parameters.
///
/// `theta` is stored in radians; use [`CurveParams::theta_degrees`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    pub theta: f64,
    pub m: f64,
    pub x_offset: f64,
}

impl CurveParams {
    /// Dimension of the search space.
    pub const DIM: usize = 3;

    pub fn new(theta: f64, m: f64, x_offset: f64) -> Self {
        Self { theta, m, x_offset }
    }

    /// Build from an optimizer vector ordered `[θ, M, X]`.
    ///
    /// # Panics
    /// Panics if `v` has fewer than three elements.
    pub fn from_slice(v: &[f64]) -> Self {
        Self {
            theta: v[0],
            m: v[1],
            x_offset: v[2],
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.theta, self.m, self.x_offset]
    }

    pub fn theta_degrees(self) -> f64 {
        self.theta.to_degrees()
    }
}

/// Inclusive box constraints for each parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    /// θ range in radians.
    pub theta: (f64, f64),
    pub m: (f64, f64),
    pub x_offset: (f64, f64),
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self {
            theta: (0.0, 50.0_f64.to_radians()),
            m: (-0.05, 0.05),
            x_offset: (0.0, 100.0),
        }
    }
}

impl ParamBounds {
    pub fn lower(&self) -> [f64; 3] {
        [self.theta.0, self.m.0, self.x_offset.0]
    }

    pub fn upper(&self) -> [f64; 3] {
        [self.theta.1, self.m.1, self.x_offset.1]
    }
}

/// Per-point error metric aggregated by the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// Mean of `|dx| + |dy|`.
    L1,
    /// Mean of `dx² + dy²`.
    L2,
}

impl LossKind {
    pub fn display_name(self) -> &'static str {
        match self {
            LossKind::L1 => "L1 distance",
            LossKind::L2 => "squared distance",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,

    pub grid_start: f64,
    pub grid_end: f64,
    /// Number of verification rows written to `output_path`.
    pub sample_count: usize,

    pub bounds: ParamBounds,
    pub loss: LossKind,

    /// Relative convergence tolerance on the population's objective spread.
    pub tolerance: f64,
    /// Absolute convergence tolerance on the population's objective spread.
    pub abs_tolerance: f64,
    pub max_generations: usize,
    /// Population size multiplier (members = `popsize * 3`).
    pub popsize: usize,
    pub seed: Option<u64>,
    pub polish: bool,
    /// Downgrade a missed convergence criterion from an error to a warning.
    pub allow_unconverged: bool,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_fit: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("xy_data.csv"),
            output_path: PathBuf::from("fitted_points.csv"),
            grid_start: 6.0,
            grid_end: 60.0,
            sample_count: 10,
            bounds: ParamBounds::default(),
            loss: LossKind::L1,
            tolerance: 1e-6,
            abs_tolerance: 0.0,
            max_generations: 2000,
            popsize: 15,
            seed: None,
            polish: true,
            allow_unconverged: false,
            top_n: 5,
            plot: false,
            plot_width: 80,
            plot_height: 25,
            export_fit: None,
        }
    }
}

/// Settings for generating a synthetic dataset from known parameters.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub output_path: PathBuf,
    pub n_points: usize,
    pub params: CurveParams,
    pub grid_start: f64,
    pub grid_end: f64,
    /// Standard deviation of Gaussian noise added to both coordinates.
    pub noise_sd: f64,
    /// Probability that a point is displaced as an outlier.
    pub outlier_prob: f64,
    /// Outlier displacement in multiples of `max(noise_sd, 1)`.
    pub outlier_k: f64,
    pub seed: u64,
}

/// Output of the optimizer for the curve parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub params: CurveParams,
    /// Objective value at `params` (mean L1 distance for [`LossKind::L1`]).
    pub objective: f64,
    pub loss: LossKind,
    pub generations: usize,
    pub evaluations: usize,
    pub converged: bool,
    /// Whether the local polish improved on the global optimum.
    pub polished: bool,
    pub message: String,
}

/// Per-observation fit diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct PointResidual {
    pub index: usize,
    pub t: f64,
    pub observed: Observation,
    pub x_pred: f64,
    pub y_pred: f64,
    /// `|dx| + |dy|`.
    pub error: f64,
}

/// A row of the verification table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub t: f64,
    pub x_pred: f64,
    pub y_pred: f64,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub grid_start: f64,
    pub grid_end: f64,
    pub bounds: ParamBounds,
    pub theta_degrees: f64,
    pub result: FitResult,
    pub observations: Vec<Observation>,
    pub curve: Vec<SampleRow>,
}
