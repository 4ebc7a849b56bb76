//! Bounded Nelder–Mead simplex search, used to polish the global optimum.
//!
//! Every trial vertex (reflection, expansion, contraction, shrink) is projected
//! onto the box before it is evaluated. The search is derivative-free, which
//! suits the L1 objective: it has kinks wherever a residual crosses zero.

use nalgebra::DVector;

use crate::error::AppError;
use crate::fit::minimizer::{BoundedMinimizer, Bounds, Minimum, Objective, energy};

/// Relative step used to build the initial simplex around the start point.
const REL_STEP: f64 = 0.05;
/// Step used for coordinates that start at zero.
const ZERO_STEP: f64 = 0.00025;

#[derive(Debug, Clone)]
pub struct NelderMead {
    alpha: f64, // reflection
    gamma: f64, // expansion
    rho: f64,   // contraction
    sigma: f64, // shrink
    /// Iteration budget per dimension.
    iters_per_dim: usize,
    xatol: f64,
    fatol: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            iters_per_dim: 200,
            xatol: 1e-10,
            fatol: 1e-12,
        }
    }
}

impl NelderMead {
    #[must_use]
    pub fn with_iterations_per_dim(mut self, n: usize) -> Self {
        self.iters_per_dim = n;
        self
    }

    /// Minimize starting from `start` (projected onto the box first).
    pub fn minimize_from(&self, objective: &Objective<'_>, bounds: &Bounds, start: &[f64]) -> Minimum {
        let dim = bounds.dim();
        let mut x0 = DVector::from_column_slice(start);
        bounds.project(&mut x0);

        let mut simplex = initial_simplex(&x0, bounds);
        let mut values: Vec<f64> = simplex.iter().map(|v| energy(objective, v)).collect();
        let mut evaluations = simplex.len();

        let max_iters = self.iters_per_dim * dim;
        let mut iterations = 0;
        let mut converged = false;

        let eval = |v: DVector<f64>, evaluations: &mut usize| -> (DVector<f64>, f64) {
            let mut v = v;
            bounds.project(&mut v);
            *evaluations += 1;
            let f = energy(objective, &v);
            (v, f)
        };

        while iterations < max_iters {
            sort_simplex(&mut simplex, &mut values);

            if self.is_tight(&simplex, &values) {
                converged = true;
                break;
            }
            iterations += 1;

            let worst = dim;
            let centroid = simplex[..worst]
                .iter()
                .fold(DVector::<f64>::zeros(dim), |acc, v| acc + v)
                / dim as f64;

            let (reflected, f_r) =
                eval(&centroid + (&centroid - &simplex[worst]) * self.alpha, &mut evaluations);

            if f_r < values[0] {
                let (expanded, f_e) =
                    eval(&centroid + (&reflected - &centroid) * self.gamma, &mut evaluations);
                if f_e < f_r {
                    simplex[worst] = expanded;
                    values[worst] = f_e;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_r;
                }
                continue;
            }

            if f_r < values[worst - 1] {
                simplex[worst] = reflected;
                values[worst] = f_r;
                continue;
            }

            // Contract towards the better of the reflected and worst vertices.
            let (toward, f_toward) = if f_r < values[worst] {
                (&reflected, f_r)
            } else {
                (&simplex[worst], values[worst])
            };
            let (contracted, f_c) =
                eval(&centroid + (toward - &centroid) * self.rho, &mut evaluations);
            if f_c < f_toward {
                simplex[worst] = contracted;
                values[worst] = f_c;
                continue;
            }

            let best = simplex[0].clone();
            for i in 1..=dim {
                let (shrunk, f_s) =
                    eval(&best + (&simplex[i] - &best) * self.sigma, &mut evaluations);
                simplex[i] = shrunk;
                values[i] = f_s;
            }
        }

        sort_simplex(&mut simplex, &mut values);
        let message = if converged {
            format!("Simplex converged after {iterations} iterations.")
        } else {
            format!("Maximum number of iterations ({max_iters}) reached.")
        };

        Minimum {
            x: simplex[0].as_slice().to_vec(),
            value: values[0],
            iterations,
            evaluations,
            converged,
            message,
        }
    }

    fn is_tight(&self, simplex: &[DVector<f64>], values: &[f64]) -> bool {
        let f_spread = values[1..]
            .iter()
            .map(|f| (f - values[0]).abs())
            .fold(0.0, f64::max);
        let x_spread = simplex[1..]
            .iter()
            .map(|v| (v - &simplex[0]).amax())
            .fold(0.0, f64::max);
        x_spread <= self.xatol && f_spread <= self.fatol
    }
}

impl BoundedMinimizer for NelderMead {
    fn name(&self) -> &'static str {
        "nelder-mead"
    }

    /// Start from the centre of the box.
    fn minimize(&self, objective: &Objective<'_>, bounds: &Bounds) -> Result<Minimum, AppError> {
        let start = bounds.center();
        Ok(self.minimize_from(objective, bounds, start.as_slice()))
    }
}

/// One vertex per axis, offset from `x0` by a step proportional to `|x0[i]|`.
///
/// Steps that would leave the box go the other way instead.
fn initial_simplex(x0: &DVector<f64>, bounds: &Bounds) -> Vec<DVector<f64>> {
    let dim = x0.len();
    let mut simplex = Vec::with_capacity(dim + 1);
    simplex.push(x0.clone());

    for i in 0..dim {
        let width = bounds.width(i);
        let mut step = if x0[i] != 0.0 { REL_STEP * x0[i].abs() } else { ZERO_STEP };
        if width > 0.0 {
            step = step.min(0.5 * width);
        }
        let mut v = x0.clone();
        v[i] = if x0[i] + step <= bounds.upper()[i] {
            x0[i] + step
        } else {
            (x0[i] - step).max(bounds.lower()[i])
        };
        simplex.push(v);
    }
    simplex
}

/// Sort vertices by objective value, best first.
fn sort_simplex(simplex: &mut [DVector<f64>], values: &mut [f64]) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let sorted_vertices: Vec<DVector<f64>> = order.iter().map(|&i| simplex[i].clone()).collect();
    let sorted_values: Vec<f64> = order.iter().map(|&i| values[i]).collect();
    simplex.clone_from_slice(&sorted_vertices);
    values.copy_from_slice(&sorted_values);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rosenbrock(x: &[f64]) -> f64 {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
    }

    #[test]
    fn minimizes_rosenbrock_inside_box() {
        let bounds = Bounds::new(vec![-2.0, -2.0], vec![2.0, 2.0]).unwrap();
        let nm = NelderMead::default().with_iterations_per_dim(2000);
        let min = nm.minimize_from(&rosenbrock, &bounds, &[-1.2, 1.0]);
        assert!((min.x[0] - 1.0).abs() < 1e-4, "{:?}", min.x);
        assert!((min.x[1] - 1.0).abs() < 1e-4, "{:?}", min.x);
    }

    #[test]
    fn respects_bounds_when_optimum_is_outside() {
        let bounds = Bounds::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let f = |x: &[f64]| {
            assert!(x.iter().all(|v| (0.0..=1.0).contains(v)), "evaluated outside box: {x:?}");
            (x[0] - 3.0).powi(2) + (x[1] + 2.0).powi(2)
        };
        let min = NelderMead::default().minimize_from(&f, &bounds, &[0.5, 0.5]);
        assert!((min.x[0] - 1.0).abs() < 1e-4, "{:?}", min.x);
        assert!(min.x[1].abs() < 1e-4, "{:?}", min.x);
    }

    #[test]
    fn never_worse_than_start() {
        let bounds = Bounds::new(vec![-1.0; 3], vec![1.0; 3]).unwrap();
        let f = |x: &[f64]| x.iter().map(|v| v.abs()).sum::<f64>();
        let start = [0.3, -0.2, 0.7];
        let min = NelderMead::default().minimize_from(&f, &bounds, &start);
        assert!(min.value <= f(&start));
    }

    #[test]
    fn start_on_upper_face_steps_inward() {
        let bounds = Bounds::new(vec![0.0], vec![1.0]).unwrap();
        let simplex = initial_simplex(&DVector::from_vec(vec![1.0]), &bounds);
        assert!(simplex[1][0] < 1.0);
        assert!(bounds.contains(simplex[1].as_slice()));
    }

    #[test]
    fn usable_as_global_minimizer() {
        let bounds = Bounds::new(vec![-4.0, -4.0], vec![4.0, 4.0]).unwrap();
        let f = |x: &[f64]| (x[0] - 1.5).powi(2) + (x[1] + 0.5).powi(2);
        let min = NelderMead::default().minimize(&f, &bounds).unwrap();
        assert!((min.x[0] - 1.5).abs() < 1e-5);
        assert!((min.x[1] + 0.5).abs() < 1e-5);
    }
}
