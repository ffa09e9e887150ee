//! Levenberg–Marquardt root finder for the equilibrium composition at one temperature.
//!
//! The unknowns are the log-ratios `a = ln(x/z)` and `b = ln(y/z)`:
//! - every finite iterate maps to a composition strictly inside the simplex
//! - `z` stays accurate when it is many orders of magnitude below 1
//! - the residual is the same pair of equations, with the `ln` terms exact
//!
//! Each iteration solves the Marquardt-scaled normal equations
//! `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀ F`, accepting the step only if it reduces
//! `|F|²`. Damping drops by 10 on acceptance and rises by 10 on rejection.

use nalgebra::{Matrix2, Vector2};
use tracing::trace;

use crate::domain::{EquilibriumPoint, ModelParameters};
use crate::error::ModelError;
use crate::models::GibbsModel;

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Maximum outer iterations (Jacobian evaluations).
    pub max_iterations: usize,
    /// Convergence threshold on `max(|eq1|, |eq2|) / (R·T)`.
    pub tolerance: f64,
    pub initial_damping: f64,
    /// Damping above which the solve is declared stuck.
    pub max_damping: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-11,
            initial_damping: 1e-3,
            max_damping: 1e16,
        }
    }
}

const MIN_DAMPING: f64 = 1e-12;

/// A converged equilibrium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub point: EquilibriumPoint,
    /// `(ln(x/z), ln(y/z))` at the root; exact even when `point.z` is clamped.
    pub log_ratios: (f64, f64),
    pub iterations: usize,
    /// Final `max(|eq1|, |eq2|) / (R·T)`.
    pub residual: f64,
}

/// Finds `(x, y)` with `eq1 = eq2 = 0` for one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumSolver {
    model: GibbsModel,
    options: SolverOptions,
}

impl EquilibriumSolver {
    pub fn new(params: ModelParameters, gas_constant: f64) -> Self {
        Self::with_options(params, gas_constant, SolverOptions::default())
    }

    pub fn with_options(
        params: ModelParameters,
        gas_constant: f64,
        options: SolverOptions,
    ) -> Self {
        Self {
            model: GibbsModel::new(params, gas_constant),
            options,
        }
    }

    pub fn model(&self) -> &GibbsModel {
        &self.model
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Solve at `t` starting from the composition `(x, y)`.
    pub fn solve_from_xy(&self, t: f64, x: f64, y: f64) -> Result<Solution, ModelError> {
        let guess = EquilibriumPoint::from_xy(x, y)?;
        self.solve(t, &guess)
    }

    /// Solve at `t` starting from `guess`.
    ///
    /// `guess.z` is used as given, so a previous solution can be passed back in
    /// without losing precision on the smallest fraction.
    pub fn solve(&self, t: f64, guess: &EquilibriumPoint) -> Result<Solution, ModelError> {
        self.validate(t)?;
        let EquilibriumPoint { x, y, z } = *guess;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) || x <= 0.0 || y <= 0.0 || z <= 0.0 {
            return Err(ModelError::invalid(format!(
                "initial guess (x={x}, y={y}, z={z}) must lie strictly inside the simplex"
            )));
        }
        let (a, b) = guess.log_ratios();
        self.iterate(t, a, b)
    }

    /// Solve at `t` starting from the log-ratios `(ln(x/z), ln(y/z))`.
    ///
    /// Used to warm-start from a previous [`Solution::log_ratios`]: below a few
    /// kelvin the fractions themselves underflow, the log-ratios do not.
    pub fn solve_log_ratios(&self, t: f64, a: f64, b: f64) -> Result<Solution, ModelError> {
        self.validate(t)?;
        if !(a.is_finite() && b.is_finite()) {
            return Err(ModelError::invalid(format!(
                "initial log-ratios (a={a}, b={b}) must be finite"
            )));
        }
        self.iterate(t, a, b)
    }

    fn iterate(&self, t: f64, mut a: f64, mut b: f64) -> Result<Solution, ModelError> {
        let model = &self.model;
        let rt = model.thermal_energy(t);
        let mut point = EquilibriumPoint::from_log_ratios(a, b);
        let mut f = model.log_ratio_residual(t, a, b, &point);
        let mut cost = sum_sq(&f);
        let mut damping = self.options.initial_damping;

        for iteration in 0..self.options.max_iterations {
            let residual = scaled_max(&f, rt);
            trace!(temperature = t, iteration, residual, damping, "equilibrium iteration");
            if residual < self.options.tolerance {
                return Ok(Solution {
                    point,
                    log_ratios: (a, b),
                    iterations: iteration,
                    residual,
                });
            }

            let j = to_matrix(model.log_ratio_jacobian(t, &point));
            let normal = j.transpose() * j;
            let gradient = j.transpose() * Vector2::new(f[0], f[1]);
            let diag_floor = f64::EPSILON * normal.trace().max(f64::MIN_POSITIVE);
            let diag = Matrix2::from_diagonal(&Vector2::new(
                normal[(0, 0)].max(diag_floor),
                normal[(1, 1)].max(diag_floor),
            ));

            let mut accepted = false;
            while damping <= self.options.max_damping {
                let Some(step) = (normal + diag * damping).lu().solve(&(-gradient)) else {
                    damping *= 10.0;
                    continue;
                };
                if !(step[0].is_finite() && step[1].is_finite()) {
                    damping *= 10.0;
                    continue;
                }

                let (ta, tb) = (a + step[0], b + step[1]);
                let trial = EquilibriumPoint::from_log_ratios(ta, tb);
                let tf = model.log_ratio_residual(t, ta, tb, &trial);
                let trial_cost = sum_sq(&tf);

                if trial_cost.is_finite() && trial.is_interior() && trial_cost < cost {
                    a = ta;
                    b = tb;
                    point = trial;
                    f = tf;
                    cost = trial_cost;
                    damping = (damping / 10.0).max(MIN_DAMPING);
                    accepted = true;
                    break;
                }
                damping *= 10.0;
            }

            if !accepted {
                return Err(self.failure(
                    t,
                    iteration + 1,
                    scaled_max(&f, rt),
                    "damping ceiling reached without reducing the residual",
                ));
            }
        }

        let residual = scaled_max(&f, rt);
        if residual < self.options.tolerance {
            return Ok(Solution {
                point,
                log_ratios: (a, b),
                iterations: self.options.max_iterations,
                residual,
            });
        }
        Err(self.failure(
            t,
            self.options.max_iterations,
            residual,
            "iteration budget exhausted",
        ))
    }

    fn validate(&self, t: f64) -> Result<(), ModelError> {
        if !t.is_finite() || t <= 0.0 {
            return Err(ModelError::invalid(format!(
                "temperature must be a finite positive number of kelvin (got {t})"
            )));
        }
        if !self.model.gas_constant.is_finite() || self.model.gas_constant <= 0.0 {
            return Err(ModelError::invalid(format!(
                "gas constant must be finite and positive (got {})",
                self.model.gas_constant
            )));
        }
        self.model.params.validate()

    }

    fn failure(&self, t: f64, iterations: usize, residual: f64, reason: &str) -> ModelError {
        ModelError::NonConvergence {
            temperature: t,
            iterations,
            residual,
            reason: reason.to_string(),
            step: None,
            trial: None,
        }
    }
}

fn sum_sq(f: &[f64; 2]) -> f64 {
    f[0] * f[0] + f[1] * f[1]
}

fn scaled_max(f: &[f64; 2], rt: f64) -> f64 {
    f[0].abs().max(f[1].abs()) / rt
}

fn to_matrix(j: [[f64; 2]; 2]) -> Matrix2<f64> {
    Matrix2::new(j[0][0], j[0][1], j[1][0], j[1][1])
}
