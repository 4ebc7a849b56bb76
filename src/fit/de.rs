//! Differential Evolution (DE) over a bounded box.
//!
//! DE keeps a population of candidate vectors and improves it generation by
//! generation:
//!
//! 1. **Mutation** (`best/1`): `v = x_best + F * (x_r1 - x_r2)`, with `F` drawn
//!    uniformly from the dither range once per generation.
//! 2. **Binomial crossover**: each component of the trial comes from `v` with
//!    probability CR (and at least one component always does).
//! 3. **Selection**: the trial replaces its parent when `f(trial) <= f(parent)`.
//!
//! Trial components that leave the box are resampled uniformly inside it, so the
//! objective is never evaluated outside the bounds.
//!
//! All random draws for a generation happen before its trials are evaluated;
//! evaluation runs in parallel and cannot change the outcome, so a seeded run is
//! reproducible regardless of thread count.
//!
//! The run stops once the population's objective values satisfy
//! `std(f) <= atol + tol * |mean(f)|`, or after `max_generations`.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `popsize` | 15 | Members per dimension |
//! | `mutation` (F) | `[0.5, 1.0)` | Dither range for the mutation factor |
//! | `crossover_rate` (CR) | 0.7 | Probability of taking a mutant component |
//! | `tolerance` | 1e-6 | Relative spread tolerance |
//! | `abs_tolerance` | 0 | Absolute spread tolerance |
//! | `max_generations` | 2000 | Generation budget |
//! | `seed` | random | RNG seed for reproducibility |

use nalgebra::DVector;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::debug;

use crate::domain::FitConfig;
use crate::error::AppError;
use crate::fit::minimizer::{BoundedMinimizer, Bounds, Minimum, Objective, energy};
use crate::math::{mean, std_dev};

/// Smallest population that still leaves two donors besides the target.
const MIN_POPULATION: usize = 5;

/// How often (in generations) progress is logged at debug level.
const LOG_EVERY: usize = 100;

/// Bounded differential evolution (`best/1/bin`).
#[derive(Debug, Clone)]
pub struct DifferentialEvolution {
    popsize: usize,
    mutation: (f64, f64),
    crossover_rate: f64,
    tolerance: f64,
    abs_tolerance: f64,
    max_generations: usize,
    seed: Option<u64>,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DifferentialEvolution {
    pub fn builder() -> DifferentialEvolutionBuilder {
        DifferentialEvolutionBuilder::new()
    }

    /// Optimizer settings taken from a fit configuration.
    pub fn from_config(config: &FitConfig) -> Self {
        let mut builder = Self::builder()
            .popsize(config.popsize)
            .tolerance(config.tolerance)
            .abs_tolerance(config.abs_tolerance)
            .max_generations(config.max_generations);
        if let Some(seed) = config.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.popsize == 0 {
            return Err(AppError::input("Population size multiplier must be >= 1."));
        }
        let (f_lo, f_hi) = self.mutation;
        if !(f_lo.is_finite() && f_hi.is_finite() && 0.0 <= f_lo && f_lo < f_hi && f_hi <= 2.0) {
            return Err(AppError::input(format!(
                "Invalid mutation range [{f_lo}, {f_hi}) (need 0 <= lo < hi <= 2)."
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(AppError::input(format!(
                "Crossover rate must be within [0, 1], got {}.",
                self.crossover_rate
            )));
        }
        if !(self.tolerance >= 0.0 && self.abs_tolerance >= 0.0) {
            return Err(AppError::input("Convergence tolerances must be >= 0."));
        }
        Ok(())
    }

    fn population_size(&self, dim: usize) -> usize {
        (self.popsize * dim).max(MIN_POPULATION)
    }

    fn has_converged(&self, energies: &[f64]) -> bool {
        if energies.iter().any(|e| !e.is_finite()) {
            return false;
        }
        std_dev(energies) <= self.abs_tolerance + self.tolerance * mean(energies).abs()
    }

    fn trial(
        &self,
        rng: &mut StdRng,
        population: &[DVector<f64>],
        best_idx: usize,
        target: usize,
        f: f64,
        bounds: &Bounds,
    ) -> DVector<f64> {
        let donors = select_random_indices(rng, population.len(), 2, &[target]);
        let mutant = &population[best_idx] + (&population[donors[0]] - &population[donors[1]]) * f;

        let dim = bounds.dim();
        let forced = rng.gen_range(0..dim);
        let mut trial = population[target].clone();
        for j in 0..dim {
            if j == forced || rng.r#gen::<f64>() < self.crossover_rate {
                trial[j] = mutant[j];
            }
        }

        for j in 0..dim {
            let (lo, hi) = (bounds.lower()[j], bounds.upper()[j]);
            if !(trial[j] >= lo && trial[j] <= hi) {
                trial[j] = rng.gen_range(lo..=hi);
            }
        }
        trial
    }
}

impl BoundedMinimizer for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential evolution"
    }

    fn minimize(&self, objective: &Objective<'_>, bounds: &Bounds) -> Result<Minimum, AppError> {
        self.validate()?;

        let dim = bounds.dim();
        let n_pop = self.population_size(dim);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut population = latin_hypercube(&mut rng, bounds, n_pop);
        let mut energies: Vec<f64> = population.par_iter().map(|x| energy(objective, x)).collect();
        let mut evaluations = n_pop;
        let mut best_idx = argmin(&energies);

        if !energies[best_idx].is_finite() {
            return Ok(Minimum {
                x: population[best_idx].as_slice().to_vec(),
                value: energies[best_idx],
                iterations: 0,
                evaluations,
                converged: false,
                message: "Objective is non-finite for every initial candidate.".to_string(),
            });
        }

        let mut generations = 0;
        let mut converged = false;

        while generations < self.max_generations {
            generations += 1;

            let f = rng.gen_range(self.mutation.0..self.mutation.1);
            let trials: Vec<DVector<f64>> = (0..n_pop)
                .map(|i| self.trial(&mut rng, &population, best_idx, i, f, bounds))
                .collect();
            let trial_energies: Vec<f64> = trials.par_iter().map(|x| energy(objective, x)).collect();
            evaluations += n_pop;

            for (i, (trial, e)) in trials.into_iter().zip(trial_energies).enumerate() {
                if e <= energies[i] {
                    population[i] = trial;
                    energies[i] = e;
                }
            }
            best_idx = argmin(&energies);

            if generations % LOG_EVERY == 0 {
                debug!(
                    generation = generations,
                    best = energies[best_idx],
                    spread = std_dev(&energies),
                    "differential evolution progress"
                );
            }

            if self.has_converged(&energies) {
                converged = true;
                break;
            }
        }

        let message = if converged {
            format!("Population converged after {generations} generations.")
        } else {
            format!("Maximum number of generations ({}) reached.", self.max_generations)
        };

        Ok(Minimum {
            x: population[best_idx].as_slice().to_vec(),
            value: energies[best_idx],
            iterations: generations,
            evaluations,
            converged,
            message,
        })
    }
}

/// Builder for [`DifferentialEvolution`].
#[derive(Debug, Clone)]
pub struct DifferentialEvolutionBuilder {
    inner: DifferentialEvolution,
}

impl Default for DifferentialEvolutionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DifferentialEvolutionBuilder {
    pub fn new() -> Self {
        Self {
            inner: DifferentialEvolution {
                popsize: 15,
                mutation: (0.5, 1.0),
                crossover_rate: 0.7,
                tolerance: 1e-6,
                abs_tolerance: 0.0,
                max_generations: 2000,
                seed: None,
            },
        }
    }

    /// Population members per dimension.
    #[must_use]
    pub fn popsize(mut self, popsize: usize) -> Self {
        self.inner.popsize = popsize;
        self
    }

    /// Dither range `[lo, hi)` for the mutation factor.
    #[must_use]
    pub fn mutation(mut self, lo: f64, hi: f64) -> Self {
        self.inner.mutation = (lo, hi);
        self
    }

    #[must_use]
    pub fn crossover_rate(mut self, cr: f64) -> Self {
        self.inner.crossover_rate = cr;
        self
    }

    #[must_use]
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.inner.tolerance = tol;
        self
    }

    #[must_use]
    pub fn abs_tolerance(mut self, atol: f64) -> Self {
        self.inner.abs_tolerance = atol;
        self
    }

    #[must_use]
    pub fn max_generations(mut self, n: usize) -> Self {
        self.inner.max_generations = n;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.inner.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn build(self) -> DifferentialEvolution {
        self.inner
    }
}

/// Latin hypercube sample: each dimension is split into `n` equal strata and
/// every stratum receives exactly one member.
fn latin_hypercube(rng: &mut StdRng, bounds: &Bounds, n: usize) -> Vec<DVector<f64>> {
    let dim = bounds.dim();
    let mut population = vec![DVector::zeros(dim); n];
    let mut strata: Vec<usize> = (0..n).collect();

    for j in 0..dim {
        strata.shuffle(rng);
        let (lo, width) = (bounds.lower()[j], bounds.width(j));
        for (member, &k) in population.iter_mut().zip(strata.iter()) {
            let u = (k as f64 + rng.r#gen::<f64>()) / n as f64;
            member[j] = (lo + u * width).min(bounds.upper()[j]);
        }
    }
    population
}

/// Select `count` distinct random indices from `0..n`, all different from `exclude`.
fn select_random_indices(rng: &mut StdRng, n: usize, count: usize, exclude: &[usize]) -> Vec<usize> {
    let mut selected = Vec::with_capacity(count);
    while selected.len() < count {
        let idx = rng.gen_range(0..n);
        if !exclude.contains(&idx) && !selected.contains(&idx) {
            selected.push(idx);
        }
    }
    selected
}

/// Index of the smallest value; the first one wins ties.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Offset so the relative tolerance is meaningful at the optimum.
    fn sphere(x: &[f64]) -> f64 {
        1.0 + x.iter().map(|v| (v - 0.5) * (v - 0.5)).sum::<f64>()
    }

    #[test]
    fn finds_sphere_minimum() {
        let bounds = Bounds::new(vec![-5.0; 3], vec![5.0; 3]).unwrap();
        let de = DifferentialEvolution::builder().seed(7).build();
        let min = de.minimize(&sphere, &bounds).unwrap();
        assert!(min.converged, "{}", min.message);
        for v in &min.x {
            assert!((v - 0.5).abs() < 1e-2, "got {:?}", min.x);
        }
        assert!((min.value - 1.0).abs() < 1e-4);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let bounds = Bounds::new(vec![-2.0, -2.0], vec![2.0, 2.0]).unwrap();
        let de = DifferentialEvolution::builder().seed(11).max_generations(50).build();
        let a = de.minimize(&sphere, &bounds).unwrap();
        let b = de.minimize(&sphere, &bounds).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.value.to_bits(), b.value.to_bits());
        assert_eq!(a.evaluations, b.evaluations);
    }

    #[test]
    fn never_evaluates_outside_bounds() {
        let bounds = Bounds::new(vec![0.0, 10.0], vec![1.0, 10.5]).unwrap();
        let escaped = AtomicBool::new(false);
        let check = |x: &[f64]| {
            if !bounds.contains(x) {
                escaped.store(true, Ordering::Relaxed);
            }
            // Minimum sits on the upper faces, pulling mutants out of the box.
            -(x[0] + x[1])
        };
        let de = DifferentialEvolution::builder().seed(3).max_generations(200).build();
        let min = de.minimize(&check, &bounds).unwrap();
        assert!(!escaped.load(Ordering::Relaxed));
        assert!((min.x[0] - 1.0).abs() < 1e-3);
        assert!((min.x[1] - 10.5).abs() < 1e-3);
    }

    #[test]
    fn stops_at_generation_budget() {
        let bounds = Bounds::new(vec![-5.0; 2], vec![5.0; 2]).unwrap();
        let de = DifferentialEvolution::builder()
            .seed(1)
            .tolerance(0.0)
            .max_generations(5)
            .build();
        let min = de.minimize(&sphere, &bounds).unwrap();
        assert!(!min.converged);
        assert_eq!(min.iterations, 5);
        // 30 members: initial population plus five generations.
        assert_eq!(min.evaluations, 6 * 30);
    }

    #[test]
    fn reports_all_non_finite_objective() {
        let bounds = Bounds::new(vec![0.0], vec![1.0]).unwrap();
        let de = DifferentialEvolution::builder().seed(5).build();
        let min = de.minimize(&|_: &[f64]| f64::NAN, &bounds).unwrap();
        assert!(!min.converged);
        assert!(min.value.is_infinite());
        assert_eq!(min.iterations, 0);
    }

    #[test]
    fn latin_hypercube_covers_every_stratum() {
        let bounds = Bounds::new(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let pop = latin_hypercube(&mut rng, &bounds, 20);
        for j in 0..2 {
            let mut hits = [false; 20];
            for x in &pop {
                let u = (x[j] - bounds.lower()[j]) / bounds.width(j);
                hits[((u * 20.0) as usize).min(19)] = true;
            }
            assert!(hits.iter().all(|&h| h));
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bounds = Bounds::new(vec![0.0], vec![1.0]).unwrap();
        let de = DifferentialEvolution::builder().crossover_rate(1.5).build();
        assert!(de.minimize(&sphere, &bounds).is_err());
        let de = DifferentialEvolution::builder().popsize(0).build();
        assert!(de.minimize(&sphere, &bounds).is_err());
    }
}
