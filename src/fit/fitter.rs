//! Levenberg–Marquardt fit of the four model parameters.
//!
//! Given:
//! - observed `(T_i, χT_i)` pairs
//! - `χT_max` and the gas constant
//! - an initial `(dH, dS, W, gamma)`
//!
//! we minimise `Σ (χT_pred(T_i) - χT_i)²` over the active range, where every
//! residual evaluation is a full warm-started sweep that restarts from the
//! same fixed low-spin guess.
//!
//! Each iteration:
//! - builds a forward-difference Jacobian (one sweep per column, in parallel)
//! - solves the damped step `[J; sqrt(λD)] δ = [-r; 0]` by SVD
//! - accepts the step only if the cost decreases; otherwise raises λ and retries

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{
    ActiveRange, EquilibriumPoint, FitResult, IterationRecord, ModelParameters, Observation,
    Termination, TrialFailurePolicy,
};
use crate::error::ModelError;
use crate::fit::detect_active_range;
use crate::math::solve_damped_step;
use crate::solver::SolverOptions;
use crate::sweep::TemperatureSweep;

const N_PARAMS: usize = 4;
const MIN_DAMPING: f64 = 1e-15;

/// Optimizer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Budget on forward sweeps, finite-difference columns included.
    pub max_evaluations: usize,
    /// Stop when an accepted step reduces the cost by less than this fraction.
    pub ftol: f64,
    /// Stop when an accepted step is smaller than this fraction of `|p|`.
    pub xtol: f64,
    pub initial_damping: f64,
    /// Damping above which no downhill step is considered to exist.
    pub max_damping: f64,
    /// Relative finite-difference step.
    pub diff_step: f64,
    pub trial_failure: TrialFailurePolicy,
    /// Composition every sweep starts from.
    pub guess: EquilibriumPoint,
    pub solver: SolverOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            max_evaluations: 5_000,
            ftol: 1e-12,
            xtol: 1e-10,
            initial_damping: 1e-3,
            max_damping: 1e16,
            diff_step: 1e-6,
            trial_failure: TrialFailurePolicy::Penalize,
            guess: EquilibriumPoint::low_spin(),
            solver: SolverOptions::default(),
        }
    }
}

/// Fits `(dH, dS, W, gamma)` to χT observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterFitter {
    chi_t_max: f64,
    gas_constant: f64,
    options: FitOptions,
}

/// Residual vector at one parameter vector, over the active range.
struct Objective<'a, F> {
    forward: &'a F,
    temperatures: Vec<f64>,
    observed: Vec<f64>,
}

impl<F> Objective<'_, F>
where
    F: Fn(&ModelParameters, &[f64]) -> Result<Vec<f64>, ModelError> + Sync,
{
    fn residuals(&self, params: &ModelParameters) -> Result<Vec<f64>, ModelError> {
        let predicted = (self.forward)(params, &self.temperatures)?;
        Ok(predicted
            .iter()
            .zip(&self.observed)
            .map(|(p, o)| p - o)
            .collect())
    }
}

impl ParameterFitter {
    pub fn new(chi_t_max: f64, gas_constant: f64) -> Self {
        Self::with_options(chi_t_max, gas_constant, FitOptions::default())
    }

    pub fn with_options(chi_t_max: f64, gas_constant: f64, options: FitOptions) -> Self {
        Self {
            chi_t_max,
            gas_constant,
            options,
        }
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Forward model: χT at each temperature for `params`.
    pub fn predict(
        &self,
        params: &ModelParameters,
        temperatures: &[f64],
    ) -> Result<Vec<f64>, ModelError> {
        let sweep = TemperatureSweep::with_options(*params, self.gas_constant, self.options.solver);
        let series = sweep.run(temperatures, &self.options.guess)?;
        Ok(series.chi_t(self.chi_t_max))
    }

    /// Detect the active range, then fit on it.
    pub fn fit(
        &self,
        observations: &[Observation],
        initial: ModelParameters,
    ) -> Result<FitResult, ModelError> {
        let range = detect_active_range(observations, self.chi_t_max)?;
        info!(
            start = range.start,
            end = range.end,
            t_start = observations[range.start].temperature,
            t_end = observations[range.end].temperature,
            "active range"
        );
        self.fit_range(observations, range, initial)
    }

    /// Fit on an explicit inclusive sample range.
    pub fn fit_range(
        &self,
        observations: &[Observation],
        range: ActiveRange,
        initial: ModelParameters,
    ) -> Result<FitResult, ModelError> {
        let forward = |p: &ModelParameters, t: &[f64]| self.predict(p, t);
        self.fit_range_with(observations, range, initial, &forward)
    }

    /// [`fit_range`](Self::fit_range) with the forward model supplied by the
    /// caller; `forward(params, temperatures)` returns χT per temperature.
    pub fn fit_range_with<F>(
        &self,
        observations: &[Observation],
        range: ActiveRange,
        initial: ModelParameters,
        forward: &F,
    ) -> Result<FitResult, ModelError>
    where
        F: Fn(&ModelParameters, &[f64]) -> Result<Vec<f64>, ModelError> + Sync,
    {
        if range.is_empty() || range.end >= observations.len() {
            return Err(ModelError::invalid(format!(
                "active range {}..={} does not fit {} observations",
                range.start,
                range.end,
                observations.len()
            )));
        }
        if !self.chi_t_max.is_finite() || self.chi_t_max <= 0.0 {
            return Err(ModelError::invalid(format!(
                "chi_t_max must be finite and positive (got {})",
                self.chi_t_max
            )));
        }
        initial.validate()?;

        let window = range.slice(observations);
        let objective = Objective {
            forward,
            temperatures: window.iter().map(|o| o.temperature).collect(),
            observed: window.iter().map(|o| o.chi_t).collect(),
        };
        let opts = &self.options;

        // The starting point must be evaluable whatever the policy: without it
        // there is no cost to compare trials against.
        let mut params = initial;
        let mut residuals = objective
            .residuals(&params)
            .map_err(|e| e.for_trial(params))?;
        let mut cost = sum_sq(&residuals);
        let mut evaluations = 1;
        let mut penalized_trials = 0;
        let mut damping = opts.initial_damping;
        let mut history = Vec::new();

        if !cost.is_finite() {
            return Err(ModelError::FitDivergence {
                iterations: 0,
                evaluations,
                cost,
                reason: "initial cost is not finite".to_string(),
            });
        }

        for iteration in 1..=opts.max_iterations {
            let (jacobian, used) = self.jacobian(&objective, &params, &residuals)?;
            evaluations += used;

            let r = DVector::from_column_slice(&residuals);
            let scale = marquardt_scale(&jacobian);

            let accepted = loop {
                if evaluations >= opts.max_evaluations {
                    return Err(ModelError::FitDivergence {
                        iterations: iteration,
                        evaluations,
                        cost,
                        reason: "evaluation budget exhausted".to_string(),
                    });
                }
                if damping > opts.max_damping {
                    break None;
                }

                let Some(step) = solve_damped_step(&jacobian, &r, &scale, damping) else {
                    damping *= 10.0;
                    continue;
                };
                let current = DVector::from_column_slice(&params.to_array());
                let candidate = &current + &step;
                let trial =
                    ModelParameters::new(candidate[0], candidate[1], candidate[2], candidate[3]);

                evaluations += 1;
                match objective.residuals(&trial) {
                    Ok(trial_residuals) => {
                        let trial_cost = sum_sq(&trial_residuals);
                        if trial_cost.is_finite() && trial_cost < cost {
                            break Some((
                                trial,
                                trial_residuals,
                                trial_cost,
                                step.norm(),
                                candidate.norm(),
                            ));
                        }
                    }
                    Err(e)
                        if e.is_non_convergence()
                            && opts.trial_failure == TrialFailurePolicy::Penalize =>
                    {
                        penalized_trials += 1;
                        warn!(
                            iteration,
                            dh = trial.dh,
                            ds = trial.ds,
                            w = trial.w,
                            gamma = trial.gamma,
                            error = %e,
                            "trial sweep failed; rejecting step"
                        );
                    }
                    Err(e) => return Err(e.for_trial(trial)),
                }
                damping *= 10.0;
            };

            let Some((trial, trial_residuals, trial_cost, step_norm, params_norm)) = accepted else {
                info!(iteration, cost, "no downhill step left; stopping");
                return Ok(self.finish(
                    params,
                    residuals,
                    cost,
                    iteration,
                    evaluations,
                    penalized_trials,
                    Termination::Stagnated,
                    range,
                    history,
                ));
            };

            let reduction = (cost - trial_cost) / cost;
            params = trial;
            residuals = trial_residuals;
            cost = trial_cost;
            damping = (damping / 10.0).max(MIN_DAMPING);
            history.push(IterationRecord {
                iteration,
                damping,
                cost,
                params,
            });
            debug!(
                iteration,
                cost,
                damping,
                dh = params.dh,
                ds = params.ds,
                w = params.w,
                gamma = params.gamma,
                "accepted step"
            );

            let termination = if cost == 0.0 || reduction <= opts.ftol {
                Some(Termination::CostTolerance)
            } else if step_norm <= opts.xtol * (opts.xtol + params_norm) {
                Some(Termination::StepTolerance)
            } else {
                None
            };
            if let Some(termination) = termination {
                info!(iteration, evaluations, cost, ?termination, "fit converged");
                return Ok(self.finish(
                    params,
                    residuals,
                    cost,
                    iteration,
                    evaluations,
                    penalized_trials,
                    termination,
                    range,
                    history,
                ));
            }
        }

        Err(ModelError::FitDivergence {
            iterations: opts.max_iterations,
            evaluations,
            cost,
            reason: "iteration budget exhausted".to_string(),
        })
    }

    /// Forward-difference Jacobian of the residuals, one sweep per column.
    ///
    /// A column whose forward perturbation does not converge is retried with a
    /// backward difference. Returns the matrix and the sweeps spent.
    fn jacobian<F>(
        &self,
        objective: &Objective<'_, F>,
        params: &ModelParameters,
        residuals: &[f64],
    ) -> Result<(DMatrix<f64>, usize), ModelError>
    where
        F: Fn(&ModelParameters, &[f64]) -> Result<Vec<f64>, ModelError> + Sync,
    {
        let base = params.to_array();
        let h_rel = self.options.diff_step;

        let columns: Vec<Result<(Vec<f64>, usize), ModelError>> = (0..N_PARAMS)
            .into_par_iter()
            .map(|j| {
                let h = h_rel * base[j].abs().max(1.0);
                let mut used = 0;
                let mut last_err = None;
                for signed in [h, -h] {
                    let mut perturbed = base;
                    perturbed[j] += signed;
                    let trial = ModelParameters::from_array(perturbed);
                    used += 1;
                    match objective.residuals(&trial) {
                        Ok(r) => {
                            let column = r
                                .iter()
                                .zip(residuals)
                                .map(|(a, b)| (a - b) / signed)
                                .collect();
                            return Ok((column, used));
                        }
                        Err(e) if e.is_non_convergence() => last_err = Some(e.for_trial(trial)),
                        Err(e) => return Err(e.for_trial(trial)),
                    }
                }
                Err(last_err.unwrap_or_else(|| {
                    ModelError::invalid("finite-difference column could not be evaluated")
                }))
            })
            .collect();

        let m = residuals.len();
        let mut jacobian = DMatrix::<f64>::zeros(m, N_PARAMS);
        let mut used = 0;
        for (j, column) in columns.into_iter().enumerate() {
            let (values, spent) = column?;
            used += spent;
            for (i, v) in values.into_iter().enumerate() {
                jacobian[(i, j)] = v;
            }
        }
        Ok((jacobian, used))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        params: ModelParameters,
        residuals: Vec<f64>,
        cost: f64,
        iterations: usize,
        evaluations: usize,
        penalized_trials: usize,
        termination: Termination,
        active_range: ActiveRange,
        history: Vec<IterationRecord>,
    ) -> FitResult {
        let rmse = (cost / residuals.len() as f64).sqrt();
        FitResult {
            params,
            residuals,
            cost,
            rmse,
            iterations,
            evaluations,
            penalized_trials,
            termination,
            active_range,
            history,
        }
    }
}

fn sum_sq(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Diagonal of `JᵀJ`, floored so that a dead column still gets damped.
fn marquardt_scale(jacobian: &DMatrix<f64>) -> DVector<f64> {
    let diag: Vec<f64> = jacobian.column_iter().map(|c| c.norm_squared()).collect();
    let largest = diag.iter().copied().fold(0.0_f64, f64::max);
    let floor = (largest * 1e-12).max(f64::MIN_POSITIVE);
    DVector::from_iterator(diag.len(), diag.into_iter().map(|d| d.max(floor)))
}
