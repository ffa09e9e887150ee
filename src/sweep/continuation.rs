//! Continuation across temperatures.
//!
//! The free-energy surface can have several stationary points at one
//! temperature. Feeding each solution back in as the next guess keeps the
//! sweep on the branch that is continuous in T.

use tracing::debug;

use crate::domain::{EquilibriumPoint, ModelParameters, TemperatureSeries};
use crate::error::ModelError;
use crate::solver::{EquilibriumSolver, SolverOptions};

/// Sequential warm-started sweep over a temperature grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSweep {
    solver: EquilibriumSolver,
}

impl TemperatureSweep {
    pub fn new(params: ModelParameters, gas_constant: f64) -> Self {
        Self {
            solver: EquilibriumSolver::new(params, gas_constant),
        }
    }

    pub fn with_solver(solver: EquilibriumSolver) -> Self {
        Self { solver }
    }

    pub fn with_options(
        params: ModelParameters,
        gas_constant: f64,
        options: SolverOptions,
    ) -> Self {
        Self::with_solver(EquilibriumSolver::with_options(params, gas_constant, options))
    }

    pub fn solver(&self) -> &EquilibriumSolver {
        &self.solver
    }

    /// Solve at every temperature, in order, starting from `guess`.
    ///
    /// `temperatures` must be non-empty and strictly increasing. The first
    /// failing temperature aborts the sweep; its error carries the step index.
    pub fn run(
        &self,
        temperatures: &[f64],
        guess: &EquilibriumPoint,
    ) -> Result<TemperatureSeries, ModelError> {
        validate_grid(temperatures)?;

        // Carried as log-ratios: the fractions underflow in the deep low-spin
        // limit, the ratios stay exact.
        let mut points = Vec::with_capacity(temperatures.len());
        let mut carried: Option<(f64, f64)> = None;
        for (i, &t) in temperatures.iter().enumerate() {
            let solution = match carried {
                None => self.solver.solve(t, guess),
                Some((a, b)) => self.solver.solve_log_ratios(t, a, b),
            }
            .map_err(|e| e.at_step(i))?;
            carried = Some(solution.log_ratios);
            points.push(solution.point);
        }

        debug!(
            points = points.len(),
            t_start = temperatures[0],
            t_end = temperatures[temperatures.len() - 1],
            "temperature sweep finished"
        );

        Ok(TemperatureSeries {
            temperatures: temperatures.to_vec(),
            points,
        })
    }
}

fn validate_grid(temperatures: &[f64]) -> Result<(), ModelError> {
    if temperatures.is_empty() {
        return Err(ModelError::invalid("temperature grid is empty"));
    }
    if let Some(i) = temperatures.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(ModelError::invalid(format!(
            "temperatures must be strictly increasing (T[{}] = {}, T[{}] = {})",
            i,
            temperatures[i],
            i + 1,
            temperatures[i + 1]
        )));
    }
    Ok(())
}
