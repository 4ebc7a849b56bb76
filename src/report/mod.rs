//! Reporting utilities: residuals, verification samples, and formatted output.

pub mod format;

pub use format::*;

use crate::domain::{CurveParams, FitResult, Observation, PointResidual, SampleRow};
use crate::math::linspace;
use crate::models::predict_point;

/// Evaluate the fitted curve at `count` evenly spaced `t` over `[start, end]`.
pub fn sample_curve(params: &CurveParams, start: f64, end: f64, count: usize) -> Vec<SampleRow> {
    linspace(start, end, count)
        .into_iter()
        .map(|t| {
            let (x_pred, y_pred) = predict_point(t, params);
            SampleRow { t, x_pred, y_pred }
        })
        .collect()
}

/// Compute fitted values and L1 errors for each observation.
///
/// `ts` must be the grid the fit was run on.
pub fn compute_residuals(observations: &[Observation], ts: &[f64], fit: &FitResult) -> Vec<PointResidual> {
    observations
        .iter()
        .zip(ts)
        .enumerate()
        .map(|(index, (obs, &t))| {
            let (x_pred, y_pred) = predict_point(t, &fit.params);
            PointResidual {
                index,
                t,
                observed: *obs,
                x_pred,
                y_pred,
                error: (obs.x - x_pred).abs() + (obs.y - y_pred).abs(),
            }
        })
        .collect()
}

/// The `top_n` observations with the largest error, worst first.
pub fn worst_points(residuals: &[PointResidual], top_n: usize) -> Vec<PointResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.error.total_cmp(&a.error));
    sorted.truncate(top_n);
    sorted
}
