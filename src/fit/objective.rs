//! The fit objective: mean per-point distance between observations and the curve.

use crate::domain::{CurveParams, LossKind, Observation};
use crate::error::AppError;
use crate::models::predict_point;

/// Objective over a fixed dataset and `t` grid.
///
/// Holds only borrowed, read-only data, so it can be evaluated concurrently.
#[derive(Debug, Clone, Copy)]
pub struct CurveObjective<'a> {
    ts: &'a [f64],
    observations: &'a [Observation],
    loss: LossKind,
}

impl<'a> CurveObjective<'a> {
    pub fn new(ts: &'a [f64], observations: &'a [Observation], loss: LossKind) -> Result<Self, AppError> {
        if observations.is_empty() {
            return Err(AppError::new(3, "No observations to fit."));
        }
        if ts.len() != observations.len() {
            return Err(AppError::input(format!(
                "Grid length {} does not match observation count {}.",
                ts.len(),
                observations.len()
            )));
        }
        Ok(Self { ts, observations, loss })
    }

    pub fn loss(&self) -> LossKind {
        self.loss
    }

    /// Evaluate an optimizer vector ordered `[θ, M, X]`.
    pub fn evaluate(&self, v: &[f64]) -> f64 {
        self.evaluate_params(&CurveParams::from_slice(v))
    }

    /// Mean per-point loss. Overflowing candidates score `+inf`.
    pub fn evaluate_params(&self, params: &CurveParams) -> f64 {
        let total: f64 = self
            .ts
            .iter()
            .zip(self.observations)
            .map(|(&t, obs)| {
                let (x, y) = predict_point(t, params);
                let dx = obs.x - x;
                let dy = obs.y - y;
                match self.loss {
                    LossKind::L1 => dx.abs() + dy.abs(),
                    LossKind::L2 => dx * dx + dy * dy,
                }
            })
            .sum();

        let mean = total / self.observations.len() as f64;
        if mean.is_finite() { mean } else { f64::INFINITY }
    }
}
