//! Fit the curve parameters to a set of observations.
//!
//! Given:
//! - observations `(x_i, y_i)`
//! - a synthetic grid `t_i` evenly spaced over the configured range
//! - a box for `[θ, M, X]`
//!
//! we run a global bounded search on the objective and then polish the best
//! candidate with a bounded Nelder–Mead pass. The polish is kept only if it
//! improves the objective.

use tracing::{info, warn};

use crate::domain::{CurveParams, FitConfig, FitResult, Observation};
use crate::error::AppError;
use crate::fit::de::DifferentialEvolution;
use crate::fit::minimizer::{BoundedMinimizer, Bounds};
use crate::fit::objective::CurveObjective;
use crate::fit::polish::NelderMead;
use crate::math::{linspace, validate_range};

/// Fit with differential evolution configured from `config`.
pub fn fit_curve(observations: &[Observation], config: &FitConfig) -> Result<FitResult, AppError> {
    let de = DifferentialEvolution::from_config(config);
    fit_curve_with(observations, config, &de)
}

/// Fit with an arbitrary global minimizer.
pub fn fit_curve_with(
    observations: &[Observation],
    config: &FitConfig,
    global: &dyn BoundedMinimizer,
) -> Result<FitResult, AppError> {
    if observations.is_empty() {
        return Err(AppError::new(3, "No observations to fit."));
    }
    validate_range(config.grid_start, config.grid_end)?;
    let bounds = Bounds::from_params(&config.bounds)?;

    let ts = linspace(config.grid_start, config.grid_end, observations.len());
    let objective = CurveObjective::new(&ts, observations, config.loss)?;
    let f = |v: &[f64]| objective.evaluate(v);

    info!(
        optimizer = global.name(),
        n_points = observations.len(),
        loss = config.loss.display_name(),
        "starting global search"
    );
    let global_min = global.minimize(&f, &bounds)?;

    if !global_min.value.is_finite() {
        return Err(AppError::fit(format!(
            "Fit failed: the objective is non-finite everywhere sampled ({}). Last best candidate {} with value {}.",
            global_min.message,
            describe(&global_min.x),
            global_min.value
        )));
    }

    if !global_min.converged {
        let detail = format!(
            "{} Last best candidate {} with {} {:.6}.",
            global_min.message,
            describe(&global_min.x),
            config.loss.display_name(),
            global_min.value
        );
        if config.allow_unconverged {
            warn!("{detail}");
        } else {
            return Err(AppError::fit(format!(
                "Fit did not converge: {detail} Increase --max-generations or pass --allow-unconverged."
            )));
        }
    }

    info!(
        generations = global_min.iterations,
        evaluations = global_min.evaluations,
        objective = global_min.value,
        "global search finished"
    );

    let mut best = global_min.x.clone();
    let mut value = global_min.value;
    let mut evaluations = global_min.evaluations;
    let mut polished = false;
    let mut message = global_min.message.clone();

    if config.polish {
        let local = NelderMead::default().minimize_from(&f, &bounds, &best);
        evaluations += local.evaluations;
        if local.value < value {
            info!(before = value, after = local.value, "polish improved the fit");
            best = local.x;
            value = local.value;
            polished = true;
        }
        message.push(' ');
        message.push_str(&local.message);
    }

    Ok(FitResult {
        params: CurveParams::from_slice(&best),
        objective: value,
        loss: config.loss,
        generations: global_min.iterations,
        evaluations,
        converged: global_min.converged,
        polished,
        message,
    })
}

fn describe(x: &[f64]) -> String {
    if x.len() == CurveParams::DIM {
        let p = CurveParams::from_slice(x);
        format!("θ={:.6} rad, M={:.6}, X={:.6}", p.theta, p.m, p.x_offset)
    } else {
        format!("{x:?}")
    }
}
