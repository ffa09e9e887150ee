//! Shared pipeline logic behind the CLI subcommands.
//!
//! Keeping this in one place separates the workflow from presentation:
//! load inputs -> sweep/fit -> derived quantities
//!
//! `app` then only prints reports/plots and writes exports.

use rayon::prelude::*;
use tracing::info;

use crate::domain::{
    CurveGrid, EquilibriumPoint, FitConfig, FitFile, FitQuality, FitResult, ModelParameters,
    Observation, SweepConfig, SweepInput, SynthConfig, SystemSpec, TemperatureRange,
    TemperatureSeries, Transition,
};
use crate::error::AppError;
use crate::fit::{FitOptions, ParameterFitter};
use crate::io::{
    read_fit_parameters, read_observations, read_sweep_parameters, read_systems,
    validate_system_name,
};
use crate::models::GibbsModel;
use crate::sweep::{TemperatureSweep, locate_transitions};

/// Outputs of one system of a forward sweep.
#[derive(Debug, Clone)]
pub struct SystemRun {
    pub system: SystemSpec,
    pub model: GibbsModel,
    pub series: TemperatureSeries,
    pub transition: Transition,
}

/// All computed outputs of a `sco sweep` run, in input order.
#[derive(Debug, Clone)]
pub struct SweepOutput {
    pub runs: Vec<SystemRun>,
}

/// All computed outputs of a `sco fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub observations: Vec<Observation>,
    pub chi_t_max: f64,
    pub initial: ModelParameters,
    pub result: FitResult,
    /// Fitted model swept over the full observed range on a fine grid.
    pub predicted: TemperatureSeries,
    pub curve: CurveGrid,
}

/// Sweep every requested system (in parallel) and locate its transitions.
pub fn run_sweep(config: &SweepConfig) -> Result<SweepOutput, AppError> {
    let guess = EquilibriumPoint::from_xy(config.guess.0, config.guess.1)?;

    let (systems, gas_constant, range) = match &config.input {
        SweepInput::Files {
            parameters,
            systems,
        } => {
            let shared = read_sweep_parameters(parameters)?;
            let list = read_systems(systems, shared.gas_constant, shared.gamma_factor)?;
            (list, shared.gas_constant, shared.range)
        }
        SweepInput::Inline {
            name,
            params,
            gas_constant,
            range,
        } => {
            validate_system_name(name)?;
            (
                vec![SystemSpec {
                    name: name.clone(),
                    params: *params,
                }],
                *gas_constant,
                *range,
            )
        }
    };
    let grid = range.grid()?;
    info!(systems = systems.len(), points = grid.len(), "starting forward sweeps");

    let runs = systems
        .into_par_iter()
        .map(|system| {
            let sweep = TemperatureSweep::new(system.params, gas_constant);
            let outcome = sweep.run(&grid, &guess).and_then(|series| {
                let model = *sweep.solver().model();
                let cp = series.heat_capacity(&model);
                let transition = locate_transitions(&system.params, &cp)?;
                Ok((model, series, transition))
            });
            match outcome {
                Ok((model, series, transition)) => Ok(SystemRun {
                    system,
                    model,
                    series,
                    transition,
                }),
                Err(e) => Err(AppError::from(e).context(format!("system {}", system.name))),
            }
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(SweepOutput { runs })
}

/// Load the inputs, fit, and sweep the fitted model over the observed range.
pub fn run_fit(config: &FitConfig) -> Result<FitRun, AppError> {
    let start = read_fit_parameters(&config.params_path)?;
    let observations = read_observations(&config.data_path, config.column_order)?;
    info!(
        samples = observations.len(),
        chi_t_max = start.chi_t_max,
        "loaded experimental data"
    );

    let guess = EquilibriumPoint::from_xy(config.guess.0, config.guess.1)?;
    let options = FitOptions {
        max_iterations: config.max_iterations,
        trial_failure: config.trial_failure,
        guess,
        ..FitOptions::default()
    };
    let fitter = ParameterFitter::with_options(start.chi_t_max, config.gas_constant, options);
    let result = fitter.fit(&observations, start.initial)?;

    let first = observations[0].temperature;
    let last = observations[observations.len() - 1].temperature;
    let grid = TemperatureRange::new(first, last, config.grid_step).grid()?;
    let predicted = TemperatureSweep::new(result.params, config.gas_constant)
        .run(&grid, &guess)
        .map_err(|e| AppError::from(e).context("sweeping the fitted parameters"))?;
    let curve = CurveGrid {
        chi_t: predicted.chi_t(start.chi_t_max),
        temperature: grid,
    };

    Ok(FitRun {
        observations,
        chi_t_max: start.chi_t_max,
        initial: start.initial,
        result,
        predicted,
        curve,
    })
}

/// Build the portable JSON record of a fit.
pub fn fit_file(config: &FitConfig, run: &FitRun) -> FitFile {
    let range = run.result.active_range;
    FitFile {
        tool: "sco".to_string(),
        generated_at: chrono::Utc::now(),
        source: config.data_path.display().to_string(),
        chi_t_max: run.chi_t_max,
        gas_constant: config.gas_constant,
        initial: run.initial,
        params: run.result.params,
        active_range: [
            run.observations[range.start].temperature,
            run.observations[range.end].temperature,
        ],
        fit_quality: FitQuality {
            cost: run.result.cost,
            rmse: run.result.rmse,
            n: run.result.residuals.len(),
            iterations: run.result.iterations,
            evaluations: run.result.evaluations,
            penalized_trials: run.result.penalized_trials,
            termination: run.result.termination,
        },
        residuals: run.result.residuals.clone(),
        grid: run.curve.clone(),
    }
}

/// Generate synthetic observations and write them to `config.output`.
pub fn run_synth(config: &SynthConfig) -> Result<Vec<Observation>, AppError> {
    let observations = crate::data::generate_observations(config)?;
    crate::io::write_observations(&config.output, &observations)?;
    Ok(observations)
}
