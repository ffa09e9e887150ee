//! Command-line parsing for the spin-crossover model.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ColumnOrder, GAS_CONSTANT, LOW_SPIN_GUESS, TrialFailurePolicy};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sco",
    version,
    about = "Spin-crossover equilibrium model: forward sweeps and parameter fits"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sweep one or more systems over temperature and report transition temperatures.
    Sweep(SweepArgs),
    /// Fit dH, dS, W and gamma to an experimental chi*T curve.
    Fit(FitArgs),
    /// Generate a synthetic chi*T data file from known parameters.
    Synth(SynthArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
}

/// Starting composition of every sweep.
#[derive(Debug, Args, Clone)]
pub struct GuessArgs {
    /// Initial SS fraction at the first temperature.
    #[arg(long = "guess-x", default_value_t = LOW_SPIN_GUESS.0)]
    pub x: f64,

    /// Initial SQ fraction at the first temperature.
    #[arg(long = "guess-y", default_value_t = LOW_SPIN_GUESS.1)]
    pub y: f64,
}

/// Terminal plot options.
#[derive(Debug, Args, Clone)]
pub struct PlotOptions {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for the forward sweep.
#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    /// Sweep parameter file (`R f Tini Tfin dT`).
    #[arg(long, value_name = "FILE", default_value = "parameters.dat", conflicts_with = "dh")]
    pub parameters: PathBuf,

    /// Multi-system file (`name dH dS W`).
    #[arg(long, value_name = "FILE", default_value = "systems.dat", conflicts_with = "dh")]
    pub systems: PathBuf,

    /// Sweep a single system given inline instead of the files (J/mol).
    #[arg(
        long,
        requires = "ds",
        requires = "w",
        requires = "gamma",
        allow_negative_numbers = true
    )]
    pub dh: Option<f64>,

    /// Entropy difference of the inline system, J/(K·mol).
    #[arg(long, requires = "dh", allow_negative_numbers = true)]
    pub ds: Option<f64>,

    /// W of the inline system, J/mol.
    #[arg(long, requires = "dh", allow_negative_numbers = true)]
    pub w: Option<f64>,

    /// Interaction parameter of the inline system, J/mol.
    #[arg(long, requires = "dh", allow_negative_numbers = true)]
    pub gamma: Option<f64>,

    /// Name used for the inline system in reports and exports.
    #[arg(long, default_value = "system")]
    pub name: String,

    /// First temperature of the inline sweep, K.
    #[arg(long, default_value_t = 100.0)]
    pub t_start: f64,

    /// End of the inline sweep (exclusive), K.
    #[arg(long, default_value_t = 500.0)]
    pub t_end: f64,

    /// Temperature step of the inline sweep, K.
    #[arg(long, default_value_t = 2.0)]
    pub t_step: f64,

    /// Gas constant of the inline sweep, J/(K·mol).
    #[arg(long, default_value_t = GAS_CONSTANT)]
    pub gas_constant: f64,

    /// chi*T of the fully high-spin state (scales the exported chi_t column).
    #[arg(long, default_value_t = 1.0)]
    pub chi_t_max: f64,

    #[command(flatten)]
    pub guess: GuessArgs,

    #[command(flatten)]
    pub plot: PlotOptions,

    /// Write `<name>.csv` per system into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

/// Options for fitting.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Experimental data file (two columns). Prompts when omitted.
    #[arg(value_name = "DATA")]
    pub data: Option<PathBuf>,

    /// Fit parameter file (`xT_max dH dS W gamma`).
    #[arg(long, value_name = "FILE", default_value = "parameters.dat")]
    pub parameters: PathBuf,

    /// Column layout of the data file.
    #[arg(long, value_enum, default_value_t = ColumnOrder::TemperatureFirst)]
    pub columns: ColumnOrder,

    /// Gas constant, J/(K·mol).
    #[arg(long, default_value_t = GAS_CONSTANT)]
    pub gas_constant: f64,

    #[command(flatten)]
    pub guess: GuessArgs,

    /// Temperature step of the predicted curve, K.
    #[arg(long, default_value_t = 0.1)]
    pub grid_step: f64,

    /// Optimizer iteration budget.
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,

    /// What to do when a trial parameter vector cannot be swept.
    #[arg(long, value_enum, default_value_t = TrialFailurePolicy::Penalize)]
    pub on_trial_failure: TrialFailurePolicy,

    #[command(flatten)]
    pub plot: PlotOptions,

    /// Export the fit (parameters + quality + predicted grid) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export the predicted per-temperature series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_series: Option<PathBuf>,

    /// Write a Markdown debug bundle under `debug/`.
    #[arg(long)]
    pub debug: bool,
}

/// Options for synthetic data generation.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Enthalpy difference QQ-SS, J/mol.
    #[arg(long, allow_negative_numbers = true)]
    pub dh: f64,

    /// Entropy difference, J/(K·mol).
    #[arg(long, allow_negative_numbers = true)]
    pub ds: f64,

    /// W = dH(SQ-SS) - dH/2, J/mol.
    #[arg(long, allow_negative_numbers = true)]
    pub w: f64,

    /// Interaction parameter, J/mol.
    #[arg(long, allow_negative_numbers = true)]
    pub gamma: f64,

    #[arg(long, default_value_t = 100.0)]
    pub t_start: f64,

    /// End of the range (exclusive), K.
    #[arg(long, default_value_t = 400.0)]
    pub t_end: f64,

    #[arg(long, default_value_t = 1.0)]
    pub t_step: f64,

    #[arg(long, default_value_t = GAS_CONSTANT)]
    pub gas_constant: f64,

    /// chi*T of the fully high-spin state.
    #[arg(long, default_value_t = 3.5)]
    pub chi_t_max: f64,

    /// Gaussian noise standard deviation as a fraction of chi_t_max.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub guess: GuessArgs,

    /// Output data file.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: PathBuf,
}

/// Options for plotting a saved fit.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Fit JSON file produced by `sco fit --export`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Overlay the observations from this data file.
    #[arg(long, value_name = "DATA")]
    pub data: Option<PathBuf>,

    /// Column layout of the overlay data file.
    #[arg(long, value_enum, default_value_t = ColumnOrder::TemperatureFirst)]
    pub columns: ColumnOrder,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
