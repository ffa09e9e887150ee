//! Error types.
//!
//! Two layers:
//!
//! - [`ModelError`]: what the numerical core and the file loaders report
//!   (non-convergence, fit divergence, invalid input)
//! - [`AppError`]: what the binary reports (message + process exit code)

use thiserror::Error;

use crate::domain::ModelParameters;

/// Errors produced by the equilibrium solver, the temperature sweep, the
/// parameter fitter and the input loaders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The root finder did not reach its tolerance within its budget.
    #[error(
        "no convergence at T = {temperature:.3} K{} after {iterations} iterations \
         (scaled residual {residual:.3e}): {reason}{}",
        fmt_step(.step),
        fmt_trial(.trial)
    )]
    NonConvergence {
        temperature: f64,
        iterations: usize,
        residual: f64,
        reason: String,
        /// Index of the failing temperature inside a sweep.
        step: Option<usize>,
        /// Trial parameter vector being evaluated by the fitter.
        trial: Option<ModelParameters>,
    },

    /// The least-squares optimizer ran out of budget or produced a non-finite cost.
    #[error(
        "fit diverged after {iterations} iterations ({evaluations} forward sweeps, \
         cost {cost:.6e}): {reason}"
    )]
    FitDivergence {
        iterations: usize,
        evaluations: usize,
        cost: f64,
        reason: String,
    },

    /// Malformed parameters, files or temperature grids.
    #[error("invalid input: {what}")]
    InvalidInput { what: String },
}

impl ModelError {
    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidInput { what: what.into() }
    }

    /// Tag a non-convergence with the sweep step it happened at.
    pub fn at_step(self, index: usize) -> Self {
        match self {
            Self::NonConvergence {
                temperature,
                iterations,
                residual,
                reason,
                trial,
                ..
            } => Self::NonConvergence {
                temperature,
                iterations,
                residual,
                reason,
                step: Some(index),
                trial,
            },
            other => other,
        }
    }

    /// Tag a non-convergence with the trial parameters that caused it.
    pub fn for_trial(self, params: ModelParameters) -> Self {
        match self {
            Self::NonConvergence {
                temperature,
                iterations,
                residual,
                reason,
                step,
                ..
            } => Self::NonConvergence {
                temperature,
                iterations,
                residual,
                reason,
                step,
                trial: Some(params),
            },
            other => other,
        }
    }

    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::NonConvergence { .. })
    }
}

fn fmt_step(step: &Option<usize>) -> String {
    step.map(|i| format!(" (sweep step {i})")).unwrap_or_default()
}

fn fmt_trial(trial: &Option<ModelParameters>) -> String {
    trial
        .map(|p| {
            format!(
                " [trial dH={:.3}, dS={:.4}, W={:.3}, gamma={:.3}]",
                p.dh, p.ds, p.w, p.gamma
            )
        })
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prefix the message (e.g. with the system or file it concerns).
    pub fn context(mut self, ctx: impl std::fmt::Display) -> Self {
        self.message = format!("{ctx}: {}", self.message);
        self
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let exit_code = match err {
            ModelError::InvalidInput { .. } => 2,
            ModelError::NonConvergence { .. } => 4,
            ModelError::FitDivergence { .. } => 5,
        };
        Self::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> ModelError {
        ModelError::NonConvergence {
            temperature: 250.0,
            iterations: 12,
            residual: 3.5e-4,
            reason: "damping ceiling reached".to_string(),
            step: None,
            trial: None,
        }
    }

    #[test]
    fn tags_accumulate_through_layers() {
        let params = ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0);
        let err = failure().at_step(7).for_trial(params);
        match &err {
            ModelError::NonConvergence { step, trial, .. } => {
                assert_eq!(*step, Some(7));
                assert_eq!(*trial, Some(params));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("T = 250.000 K"));
        assert!(msg.contains("sweep step 7"));
        assert!(msg.contains("dH=20000.000"));
    }

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(AppError::from(ModelError::invalid("bad row")).exit_code(), 2);
        assert_eq!(AppError::from(failure()).exit_code(), 4);
        let diverged = ModelError::FitDivergence {
            iterations: 200,
            evaluations: 900,
            cost: 1.0,
            reason: "iteration budget exhausted".to_string(),
        };
        assert_eq!(AppError::from(diverged).exit_code(), 5);
    }

    #[test]
    fn context_keeps_exit_code() {
        let err = AppError::from(failure()).context("system Fe2");
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().starts_with("system Fe2: no convergence at T = 250.000 K"));
    }
}
