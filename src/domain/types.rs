//! Shared domain types.
//!
//! These types are kept small and (where they leave the process) serializable so
//! they can be:
//!
//! - passed by value through the solver, the sweep and the fitter
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Ideal gas constant used by the reference parameter sets, J/(K·mol).
pub const GAS_CONSTANT: f64 = 8.31;

/// Default starting composition for the lowest temperature of a sweep:
/// practically pure SS (low-spin/low-spin).
pub const LOW_SPIN_GUESS: (f64, f64) = (0.999999999999, 0.0000000000005);

/// The four thermodynamic parameters of the binuclear SCO model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Enthalpy difference QQ-SS, J/mol.
    pub dh: f64,
    /// Entropy difference QQ-SS, J/(K·mol).
    pub ds: f64,
    /// `ΔH(SQ-SS) - ΔH/2`, J/mol. Negative values give two-step transitions.
    pub w: f64,
    /// Interaction parameter, J/mol.
    pub gamma: f64,
}

impl ModelParameters {
    pub fn new(dh: f64, ds: f64, w: f64, gamma: f64) -> Self {
        Self { dh, ds, w, gamma }
    }

    /// Build parameters whose interaction term is a multiple `f` of the
    /// critical value `2R·dH/dS`.
    pub fn with_gamma_factor(dh: f64, ds: f64, w: f64, factor: f64, gas_constant: f64) -> Self {
        Self::new(dh, ds, w, factor * 2.0 * gas_constant * dh / ds)
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.dh, self.ds, self.w, self.gamma]
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.to_array().iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ModelError::invalid(format!(
                "model parameters must be finite (dH={}, dS={}, W={}, gamma={})",
                self.dh, self.ds, self.w, self.gamma
            )))
        }
    }

    /// `dH/dS`, the temperature where high-spin and low-spin populations are equal.
    pub fn half_transition_temperature(&self) -> f64 {
        self.dh / self.ds
    }

    /// Sign-of-W heuristic: negative W stabilises the mixed SQ state and
    /// splits the transition in two steps.
    pub fn is_two_step(&self) -> bool {
        self.w < 0.0
    }
}

/// Molar fractions of SS (`x`), SQ (`y`) and QQ (`z`) at one temperature.
///
/// `z` is stored rather than recomputed as `1 - x - y`: near the pure
/// low-spin limit `z` is many orders of magnitude below the spacing of
/// doubles around 1 and the subtraction would lose it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EquilibriumPoint {
    /// Build a composition from `(x, y)`, requiring it to lie strictly inside
    /// the simplex `x, y, 1-x-y > 0`.
    pub fn from_xy(x: f64, y: f64) -> Result<Self, ModelError> {
        let z = 1.0 - x - y;
        if !(x.is_finite() && y.is_finite()) || x <= 0.0 || y <= 0.0 || z <= 0.0 {
            return Err(ModelError::invalid(format!(
                "composition (x={x}, y={y}) must satisfy x > 0, y > 0 and x + y < 1"
            )));
        }
        Ok(Self { x, y, z })
    }

    /// The default low-spin starting guess.
    pub fn low_spin() -> Self {
        let (x, y) = LOW_SPIN_GUESS;
        Self { x, y, z: 1.0 - x - y }
    }

    /// Map log-ratio coordinates `a = ln(x/z)`, `b = ln(y/z)` back onto the simplex.
    ///
    /// Every finite `(a, b)` maps strictly inside the simplex: fractions that
    /// would underflow are held at `f64::MIN_POSITIVE`, so `log_ratios` of the
    /// result is only exact while no fraction is clamped.
    pub fn from_log_ratios(a: f64, b: f64) -> Self {
        let m = a.max(b).max(0.0);
        let ea = (a - m).exp();
        let eb = (b - m).exp();
        let ez = (-m).exp();
        let s = ea + eb + ez;
        Self {
            x: (ea / s).max(f64::MIN_POSITIVE),
            y: (eb / s).max(f64::MIN_POSITIVE),
            z: (ez / s).max(f64::MIN_POSITIVE),
        }
    }

    /// `(ln(x/z), ln(y/z))`.
    pub fn log_ratios(&self) -> (f64, f64) {
        let ln_z = self.z.ln();
        (self.x.ln() - ln_z, self.y.ln() - ln_z)
    }

    /// Fraction of metal centres in the high-spin state, `c = (y + 2z)/2`.
    pub fn high_spin_fraction(&self) -> f64 {
        (self.y + 2.0 * self.z) / 2.0
    }

    pub fn is_interior(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0 && *v <= 1.0)
    }
}

/// Half-open temperature range `[start, end)` sampled every `step` kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

/// Upper bound on generated grid sizes (protects against `step` typos).
const MAX_GRID_POINTS: usize = 10_000_000;

impl TemperatureRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(ModelError::invalid("temperature range must be finite"));
        }
        if self.start <= 0.0 {
            return Err(ModelError::invalid(format!(
                "initial temperature must be > 0 K (got {})",
                self.start
            )));
        }
        if self.step <= 0.0 {
            return Err(ModelError::invalid(format!(
                "temperature step must be > 0 K (got {})",
                self.step
            )));
        }
        if self.end <= self.start {
            return Err(ModelError::invalid(format!(
                "final temperature {} must exceed initial temperature {}",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// `start + i·step` for every value strictly below `end`.
    pub fn grid(&self) -> Result<Vec<f64>, ModelError> {
        self.validate()?;
        let n = ((self.end - self.start) / self.step).ceil();
        if n > MAX_GRID_POINTS as f64 {
            return Err(ModelError::invalid(format!(
                "temperature grid would have {n} points (limit {MAX_GRID_POINTS})"
            )));
        }
        Ok((0..n as usize)
            .map(|i| self.start + i as f64 * self.step)
            .filter(|t| *t < self.end)
            .collect())
    }
}

/// Temperatures paired one-to-one with equilibrium compositions.
///
/// Built by the temperature sweep in temperature order; derived quantities
/// (susceptibility, enthalpy, heat capacity) are computed from the fixed arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeries {
    pub temperatures: Vec<f64>,
    pub points: Vec<EquilibriumPoint>,
}

/// Heat capacity on one sampling interval, located at the interval's lower temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatCapacityPoint {
    pub temperature: f64,
    pub cp: f64,
}

/// Transition temperatures of one system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    OneStep { t_half: f64 },
    /// `lower` is the SS→SQ heat-capacity maximum, `upper` the SQ→QQ one.
    TwoStep { t_half: f64, lower: f64, upper: f64 },
}

impl Transition {
    pub fn t_half(&self) -> f64 {
        match self {
            Transition::OneStep { t_half } | Transition::TwoStep { t_half, .. } => *t_half,
        }
    }
}

/// One named system of a multi-system sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSpec {
    pub name: String,
    pub params: ModelParameters,
}

/// One experimental `(T, χT)` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub temperature: f64,
    pub chi_t: f64,
}

/// Column layout of experimental data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnOrder {
    /// `temperature chi_t`
    TemperatureFirst,
    /// `chi_t temperature` (layout written by the historical scripts).
    ChiTFirst,
}

/// What the fitter does when a trial step's forward sweep fails to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrialFailurePolicy {
    /// Reject the trial step and increase damping.
    Penalize,
    /// Abort the fit with the tagged non-convergence.
    Propagate,
}

/// Inclusive sample index range `start..=end` used by the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRange {
    pub start: usize,
    pub end: usize,
}

impl ActiveRange {
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn slice<'a, T>(&self, values: &'a [T]) -> &'a [T] {
        &values[self.start..=self.end]
    }
}

/// Why the optimizer stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative cost reduction fell below `ftol`.
    CostTolerance,
    /// Relative parameter step fell below `xtol`.
    StepTolerance,
    /// No step reduced the cost before damping hit its ceiling.
    Stagnated,
}

/// One accepted optimizer iteration (for logs and debug bundles).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub damping: f64,
    pub cost: f64,
    pub params: ModelParameters,
}

/// Output of one parameter fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub params: ModelParameters,
    /// `χT_predicted - χT_observed` over the active range at the optimum.
    pub residuals: Vec<f64>,
    /// Sum of squared residuals.
    pub cost: f64,
    pub rmse: f64,
    pub iterations: usize,
    /// Forward-model sweeps performed (finite differences included).
    pub evaluations: usize,
    pub penalized_trials: usize,
    pub termination: Termination,
    pub active_range: ActiveRange,
    pub history: Vec<IterationRecord>,
}

/// Fit diagnostics stored in the fit JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub cost: f64,
    pub rmse: f64,
    pub n: usize,
    pub iterations: usize,
    pub evaluations: usize,
    pub penalized_trials: usize,
    pub termination: Termination,
}

/// Predicted curve sampled on a regular grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub temperature: Vec<f64>,
    pub chi_t: Vec<f64>,
}

/// A saved fit (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub chi_t_max: f64,
    pub gas_constant: f64,
    pub initial: ModelParameters,
    pub params: ModelParameters,
    /// Temperatures bounding the fitted sub-range, K.
    pub active_range: [f64; 2],
    pub fit_quality: FitQuality,
    pub residuals: Vec<f64>,
    pub grid: CurveGrid,
}

/// Where a forward sweep gets its systems from.
#[derive(Debug, Clone)]
pub enum SweepInput {
    /// Parameter file (`R f Tini Tfin dT`) plus multi-system file (`name dH dS W`).
    Files { parameters: PathBuf, systems: PathBuf },
    /// A single system given on the command line.
    Inline {
        name: String,
        params: ModelParameters,
        gas_constant: f64,
        range: TemperatureRange,
    },
}

/// A forward sweep run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub input: SweepInput,
    pub guess: (f64, f64),
    pub chi_t_max: f64,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_dir: Option<PathBuf>,
}

/// An inverse fit run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub data_path: PathBuf,
    pub params_path: PathBuf,
    pub column_order: ColumnOrder,
    pub gas_constant: f64,
    pub guess: (f64, f64),
    /// Step of the predicted-curve grid, K.
    pub grid_step: f64,
    pub max_iterations: usize,
    pub trial_failure: TrialFailurePolicy,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_fit: Option<PathBuf>,
    pub export_series: Option<PathBuf>,
    pub debug: bool,
}

/// A synthetic-data run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub params: ModelParameters,
    pub gas_constant: f64,
    pub range: TemperatureRange,
    pub guess: (f64, f64),
    pub chi_t_max: f64,
    /// Noise standard deviation as a fraction of `chi_t_max`.
    pub noise: f64,
    pub seed: u64,
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_half_open() {
        let grid = TemperatureRange::new(100.0, 500.0, 2.0).grid().unwrap();
        assert_eq!(grid.len(), 200);
        assert_eq!(grid[0], 100.0);
        assert_eq!(grid[grid.len() - 1], 498.0);
    }

    #[test]
    fn grid_rejects_zero_start_and_bad_step() {
        assert!(TemperatureRange::new(0.0, 500.0, 2.0).grid().is_err());
        assert!(TemperatureRange::new(100.0, 500.0, 0.0).grid().is_err());
        assert!(TemperatureRange::new(100.0, 50.0, 1.0).grid().is_err());
    }

    #[test]
    fn log_ratios_round_trip_deep_low_spin() {
        // z far below the spacing of doubles near 1.
        let p = EquilibriumPoint::from_log_ratios(59.5, 30.0);
        assert!(p.is_interior());
        assert!(p.z > 0.0 && p.z < 1e-20);
        let (a, b) = p.log_ratios();
        assert!((a - 59.5).abs() < 1e-9);
        assert!((b - 30.0).abs() < 1e-9);
        assert!((p.x + p.y + p.z - 1.0).abs() < 1e-15);
    }

    #[test]
    fn underflowing_fractions_stay_positive() {
        let p = EquilibriumPoint::from_log_ratios(4_000.0, 2_000.0);
        assert!(p.is_interior());
        assert_eq!(p.x, 1.0);
        assert_eq!(p.y, f64::MIN_POSITIVE);
        assert_eq!(p.z, f64::MIN_POSITIVE);
        assert!(!EquilibriumPoint::from_log_ratios(f64::NAN, 0.0).is_interior());
    }

    #[test]
    fn from_xy_rejects_boundary() {
        assert!(EquilibriumPoint::from_xy(0.0, 0.5).is_err());
        assert!(EquilibriumPoint::from_xy(0.5, 0.0).is_err());
        assert!(EquilibriumPoint::from_xy(0.6, 0.4).is_err());
        assert!(EquilibriumPoint::from_xy(f64::NAN, 0.1).is_err());
        let p = EquilibriumPoint::from_xy(0.2, 0.3).unwrap();
        assert!((p.z - 0.5).abs() < 1e-15);
        assert!((p.high_spin_fraction() - 0.65).abs() < 1e-15);
    }

    #[test]
    fn gamma_factor_scales_critical_value() {
        let p = ModelParameters::with_gamma_factor(20_000.0, 100.0, 0.0, 0.5, GAS_CONSTANT);
        assert!((p.gamma - 0.5 * 2.0 * GAS_CONSTANT * 200.0).abs() < 1e-9);
    }
}
