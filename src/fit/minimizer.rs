//! Bounded minimization over a scalar objective.
//!
//! The fitter only depends on [`BoundedMinimizer`], so the global search can be
//! swapped (differential evolution, Nelder–Mead from the box centre, ...) without
//! touching the curve model or the objective.

use nalgebra::DVector;

use crate::domain::ParamBounds;
use crate::error::AppError;

/// Scalar objective shared across worker threads.
pub type Objective<'a> = dyn Fn(&[f64]) -> f64 + Sync + 'a;

/// Inclusive box constraints `lower[i] <= x[i] <= upper[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, AppError> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(AppError::input(format!(
                "Invalid bounds: lower has {} entries, upper has {}.",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(AppError::input(format!(
                    "Invalid bounds for dimension {i}: [{lo}, {hi}] (must be finite with lower<=upper)."
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Box for `[θ, M, X]`.
    pub fn from_params(bounds: &ParamBounds) -> Result<Self, AppError> {
        Self::new(bounds.lower().to_vec(), bounds.upper().to_vec())
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn width(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }

    /// Whether `x` lies inside the box; points on a face are inside.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// Project `x` onto the box component-wise.
    pub fn project(&self, x: &mut DVector<f64>) {
        for i in 0..self.dim() {
            x[i] = x[i].clamp(self.lower[i], self.upper[i]);
        }
    }

    pub fn center(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.dim(),
            self.lower.iter().zip(self.upper.iter()).map(|(lo, hi)| 0.5 * (lo + hi)),
        )
    }
}

/// Outcome of a minimization run.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    /// Generations (global) or iterations (local) performed.
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    pub message: String,
}

/// A minimizer restricted to a box.
///
/// Implementations must never evaluate `objective` outside `bounds`.
pub trait BoundedMinimizer {
    fn name(&self) -> &'static str;

    fn minimize(&self, objective: &Objective<'_>, bounds: &Bounds) -> Result<Minimum, AppError>;
}

/// Evaluate and map `NaN` to `+inf` so comparisons stay total.
pub(crate) fn energy(objective: &Objective<'_>, x: &DVector<f64>) -> f64 {
    let v = objective(x.as_slice());
    if v.is_nan() { f64::INFINITY } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_are_inside() {
        let b = Bounds::from_params(&ParamBounds::default()).unwrap();
        assert!(b.contains(&[0.0, -0.05, 100.0]));
        assert!(b.contains(&[50.0_f64.to_radians(), 0.05, 0.0]));
        assert!(!b.contains(&[0.0, -0.0500001, 50.0]));
        assert!(!b.contains(&[0.0, 0.0]));
    }

    #[test]
    fn rejects_inverted_and_mismatched() {
        assert!(Bounds::new(vec![1.0], vec![0.0]).is_err());
        assert!(Bounds::new(vec![0.0, 0.0], vec![1.0]).is_err());
        assert!(Bounds::new(vec![], vec![]).is_err());
        assert!(Bounds::new(vec![f64::NEG_INFINITY], vec![0.0]).is_err());
        // A degenerate (pinned) dimension is allowed.
        assert!(Bounds::new(vec![2.0], vec![2.0]).is_ok());
    }

    #[test]
    fn project_clamps_each_component() {
        let b = Bounds::new(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap();
        let mut x = DVector::from_vec(vec![2.0, -3.0]);
        b.project(&mut x);
        assert_eq!(x.as_slice(), &[1.0, -1.0]);
    }

    #[test]
    fn energy_maps_nan_to_infinity() {
        let f = |_: &[f64]| f64::NAN;
        assert_eq!(energy(&f, &DVector::from_vec(vec![0.0])), f64::INFINITY);
    }
}
