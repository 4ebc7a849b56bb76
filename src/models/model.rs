//! Evaluation of the spiral curve.
//!
//! ```text
//! x(t) = t·cos θ − e^(M·|t|)·sin(0.3t)·sin θ + X
//! y(t) = 42 + t·sin θ + e^(M·|t|)·sin(0.3t)·cos θ
//! ```
//!
//! A line at angle θ through `(X, 42)` carrying a sinusoidal ripple whose
//! amplitude grows (or decays) exponentially with `|t|`. Large `M·|t|` overflows
//! to `inf`; that is left to the objective to penalize.

use crate::domain::CurveParams;

/// Fixed vertical offset of the curve.
pub const Y_OFFSET: f64 = 42.0;

/// Fixed angular frequency of the ripple term.
pub const ANGULAR_FREQUENCY: f64 = 0.3;

/// Predict `(x, y)` at a single `t`.
pub fn predict_point(t: f64, params: &CurveParams) -> (f64, f64) {
    let (sin_theta, cos_theta) = params.theta.sin_cos();
    let ripple = (params.m * t.abs()).exp() * (ANGULAR_FREQUENCY * t).sin();

    let x = t * cos_theta - ripple * sin_theta + params.x_offset;
    let y = Y_OFFSET + t * sin_theta + ripple * cos_theta;
    (x, y)
}

/// Predict `(x, y)` pointwise over a grid of `t` values.
pub fn predict(ts: &[f64], params: &CurveParams) -> (Vec<f64>, Vec<f64>) {
    ts.iter().map(|&t| predict_point(t, params)).unzip()
}
