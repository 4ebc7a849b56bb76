//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{FitConfig, FitResult, LossKind, PointResidual, SampleRow};
use crate::io::ingest::DatasetStats;
use crate::math::median;

/// Format the full run summary (dataset stats + fitted parameters + optimizer diagnostics).
pub fn format_fit_summary(stats: &DatasetStats, fit: &FitResult, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== spiral - Parametric Curve Fit ===\n");
    out.push_str(&format!("Input: {}\n", config.input_path.display()));
    out.push_str(&format!(
        "Points: n={} | x=[{:.3}, {:.3}] | y=[{:.3}, {:.3}]\n",
        stats.n_points, stats.x_min, stats.x_max, stats.y_min, stats.y_max
    ));
    out.push_str(&format!(
        "Grid: t=[{}, {}] | loss={}\n",
        config.grid_start,
        config.grid_end,
        config.loss.display_name()
    ));

    out.push_str("\nOptimization results:\n");
    out.push_str(&format!("Theta (radians): {:.6}\n", fit.params.theta));
    out.push_str(&format!("Theta (degrees): {:.3}°\n", fit.params.theta_degrees()));
    out.push_str(&format!("M: {:.6}\n", fit.params.m));
    out.push_str(&format!("X: {:.6}\n", fit.params.x_offset));
    out.push_str(&format!("{}: {:.6}\n", objective_label(fit.loss), fit.objective));

    out.push_str("\nOptimizer:\n");
    out.push_str(&format!(
        "- generations={} evaluations={} converged={} polished={}\n",
        fit.generations, fit.evaluations, fit.converged, fit.polished
    ));
    out.push_str(&format!("- {}\n", fit.message));

    out
}

/// Format the verification table.
pub fn format_samples(rows: &[SampleRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>10} {:>14} {:>14}", "t", "x_pred", "y_pred"));
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<14} {:-<14}", "", "", ""));
    out.push('\n');
    for r in rows {
        out.push_str(&format!("{:>10.4} {:>14.6} {:>14.6}", r.t, r.x_pred, r.y_pred));
        out.push('\n');
    }
    out
}

/// One-line spread of the per-point errors.
pub fn format_error_spread(residuals: &[PointResidual]) -> String {
    let errors: Vec<f64> = residuals.iter().map(|r| r.error).collect();
    let max = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    match median(&errors) {
        Some(med) => format!("Point error (|dx|+|dy|): median={med:.6} max={max:.6}"),
        None => "Point error (|dx|+|dy|): n/a".to_string(),
    }
}

/// Format the largest-error observations.
pub fn format_worst_points(rows: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str("Largest errors (|dx|+|dy|):\n");
    out.push_str(&format!(
        "{:>6} {:>9} {:>12} {:>12} {:>12} {:>12} {:>10}",
        "row", "t", "x_obs", "x_pred", "y_obs", "y_pred", "error"
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:-<6} {:-<9} {:-<12} {:-<12} {:-<12} {:-<12} {:-<10}",
        "", "", "", "", "", "", ""
    ));
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{:>6} {:>9.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>10.4}",
            r.index + 1,
            r.t,
            r.observed.x,
            r.x_pred,
            r.observed.y,
            r.y_pred,
            r.error
        ));
        out.push('\n');
    }
    out
}

fn objective_label(loss: LossKind) -> &'static str {
    match loss {
        LossKind::L1 => "Minimum L1 Distance",
        LossKind::L2 => "Minimum Squared Distance",
    }
}
