//! Command-line parsing for the spiral curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::LossKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spiral", version, about = "Fit theta, M and X of a spiral curve to observed points")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the curve to a CSV of points, print the report, and write verification rows.
    Fit(FitArgs),
    /// Generate a synthetic dataset from known parameters.
    Synth(SynthArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV with `x` and `y` columns.
    #[arg(short = 'i', long, value_name = "CSV", default_value = "xy_data.csv")]
    pub input: PathBuf,

    /// Verification CSV (`t,x_pred,y_pred`).
    #[arg(short = 'o', long, value_name = "CSV", default_value = "fitted_points.csv")]
    pub output: PathBuf,

    /// First value of the evenly spaced `t` grid.
    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    pub grid_start: f64,

    /// Last value of the evenly spaced `t` grid.
    #[arg(long, default_value_t = 60.0, allow_negative_numbers = true)]
    pub grid_end: f64,

    /// Number of verification rows.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub sample_count: usize,

    /// Lower bound on theta (degrees).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub theta_min_deg: f64,

    /// Upper bound on theta (degrees).
    #[arg(long, default_value_t = 50.0, allow_negative_numbers = true)]
    pub theta_max_deg: f64,

    /// Lower bound on M.
    #[arg(long, default_value_t = -0.05, allow_negative_numbers = true)]
    pub m_min: f64,

    /// Upper bound on M.
    #[arg(long, default_value_t = 0.05, allow_negative_numbers = true)]
    pub m_max: f64,

    /// Lower bound on X.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    /// Upper bound on X.
    #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Relative convergence tolerance.
    #[arg(long, default_value_t = 1e-6)]
    pub tol: f64,

    /// Absolute convergence tolerance.
    #[arg(long, default_value_t = 0.0)]
    pub atol: f64,

    /// Maximum number of generations.
    #[arg(long, default_value_t = 2000)]
    pub max_generations: usize,

    /// Population size multiplier (members = popsize * 3).
    #[arg(long, default_value_t = 15)]
    pub popsize: usize,

    /// Random seed for the global search (omit for a fresh seed per run).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the local polish step.
    #[arg(long)]
    pub no_polish: bool,

    /// Per-point loss.
    #[arg(long, value_enum, default_value_t = LossKind::L1)]
    pub loss: LossKind,

    /// Report an unconverged fit instead of failing.
    #[arg(long)]
    pub allow_unconverged: bool,

    /// Show the N observations with the largest error.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Render an ASCII plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the fit (params + diagnostics + sampled curve) to JSON.
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output CSV (`x,y`).
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    /// Number of points.
    #[arg(short = 'n', long = "n", default_value_t = 50)]
    pub n_points: usize,

    /// Theta (radians).
    #[arg(long, default_value_t = 0.3, allow_negative_numbers = true)]
    pub theta: f64,

    /// M.
    #[arg(long, default_value_t = 0.01, allow_negative_numbers = true)]
    pub m: f64,

    /// X.
    #[arg(long = "x-offset", default_value_t = 10.0, allow_negative_numbers = true)]
    pub x_offset: f64,

    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    pub grid_start: f64,

    #[arg(long, default_value_t = 60.0, allow_negative_numbers = true)]
    pub grid_end: f64,

    /// Gaussian noise standard deviation (both coordinates).
    #[arg(long, default_value_t = 0.0)]
    pub noise_sd: f64,

    /// Probability of displacing a point as an outlier.
    #[arg(long, default_value_t = 0.0)]
    pub outlier_prob: f64,

    /// Outlier jump in multiples of max(noise_sd, 1).
    #[arg(long, default_value_t = 10.0)]
    pub outlier_k: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved fit.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Fit JSON file produced by `spiral fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults_match_the_reference_run() {
        let cli = Cli::parse_from(["spiral", "fit"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.input, PathBuf::from("xy_data.csv"));
        assert_eq!(args.output, PathBuf::from("fitted_points.csv"));
        assert_eq!(args.sample_count, 10);
        assert_eq!(args.theta_max_deg, 50.0);
        assert_eq!(args.m_min, -0.05);
        assert_eq!(args.loss, LossKind::L1);
        assert!(!args.no_polish);
    }

    #[test]
    fn verbosity_counts_and_negative_bounds_parse() {
        let cli = Cli::parse_from([
            "spiral", "-vv", "fit", "--m-min", "-0.1", "--loss", "l2", "--seed", "7",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.m_min, -0.1);
        assert_eq!(args.loss, LossKind::L2);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn plot_requires_fit_path() {
        assert!(Cli::try_parse_from(["spiral", "plot"]).is_err());
    }
}
