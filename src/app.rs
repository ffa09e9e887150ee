//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the tracing subscriber
//! - parses CLI arguments
//! - runs sweeps, fits and synthetic data generation
//! - prints reports/plots
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FitArgs, PlotArgs, SweepArgs, SynthArgs};
use crate::domain::{
    FitConfig, ModelParameters, SweepConfig, SweepInput, SynthConfig, TemperatureRange,
};
use crate::error::AppError;

pub mod pipeline;

/// Number of worst samples listed under the fit report.
const WORST_RESIDUALS: usize = 5;

/// Entry point for the `sco` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    // `sco` and `sco data.dat` behave like `sco fit ...`.
    //
    // Clap requires a subcommand name, so we rewrite argv before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Sweep(args) => handle_sweep(args),
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
        Command::Plot(args) => handle_plot(args),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second initialization (tests) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_sweep(args: SweepArgs) -> Result<(), AppError> {
    let config = sweep_config_from_args(&args);
    let output = pipeline::run_sweep(&config)?;

    if let Some(dir) = &config.export_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            AppError::new(2, format!("Failed to create {}: {e}", dir.display()))
        })?;
    }

    for run in &output.runs {
        println!(
            "{}",
            crate::report::format_transition(&run.system.name, &run.transition)
        );

        if config.plot {
            let markers = match run.transition {
                crate::domain::Transition::OneStep { t_half } => vec![t_half],
                crate::domain::Transition::TwoStep {
                    t_half,
                    lower,
                    upper,
                } => vec![lower, t_half, upper],
            };
            let plot = crate::plot::render_series_plot(
                &run.series.temperatures,
                &run.series.high_spin_fractions(),
                &markers,
                "c",
                config.plot_width,
                config.plot_height,
            );
            println!("{plot}");
        }

        if let Some(dir) = &config.export_dir {
            let path = dir.join(format!("{}.csv", run.system.name));
            crate::io::write_series_csv(&path, &run.series.rows(&run.model, config.chi_t_max))?;
            info!(path = %path.display(), "wrote series");
        }
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let data_path = match &args.data {
        Some(path) => crate::cli::picker::validate_data_path(path)?,
        None => crate::cli::picker::prompt_for_data_path()?,
    };
    let config = fit_config_from_args(&args, data_path);
    let run = pipeline::run_fit(&config)?;

    let source = config.data_path.display().to_string();
    println!(
        "{}",
        crate::report::format_fit_report(&source, &run.observations, &run.initial, &run.result)
    );
    println!(
        "{}",
        crate::report::format_worst_residuals(&run.observations, &run.result, WORST_RESIDUALS)
    );

    if config.plot {
        let plot = crate::plot::render_fit_plot(
            &run.observations,
            &run.curve,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_fit {
        crate::io::write_fit_json(path, &pipeline::fit_file(&config, &run))?;
    }
    if let Some(path) = &config.export_series {
        let model = crate::models::GibbsModel::new(run.result.params, config.gas_constant);
        crate::io::write_series_csv(path, &run.predicted.rows(&model, run.chi_t_max))?;
    }
    if config.debug {
        let path = crate::debug::write_debug_bundle(
            Path::new("debug"),
            &config,
            &run.observations,
            run.chi_t_max,
            &run.initial,
            &run.result,
        )?;
        println!("Debug bundle: {}", path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let observations = pipeline::run_synth(&config)?;
    println!(
        "Wrote {} samples to {}",
        observations.len(),
        config.output.display()
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let fit = crate::io::read_fit_json(&args.fit)?;

    let plot = match &args.data {
        Some(path) => {
            let observations = crate::io::read_observations(path, args.columns)?;
            crate::plot::render_fit_plot(&observations, &fit.grid, args.width, args.height)
        }
        None => crate::plot::render_curve_plot(&fit.grid, args.width, args.height),
    };

    println!("{}", crate::report::format_parameters(&fit.params));
    println!("{plot}");
    Ok(())
}

pub fn sweep_config_from_args(args: &SweepArgs) -> SweepConfig {
    let input = match (args.dh, args.ds, args.w, args.gamma) {
        (Some(dh), Some(ds), Some(w), Some(gamma)) => SweepInput::Inline {
            name: args.name.clone(),
            params: ModelParameters::new(dh, ds, w, gamma),
            gas_constant: args.gas_constant,
            range: TemperatureRange::new(args.t_start, args.t_end, args.t_step),
        },
        _ => SweepInput::Files {
            parameters: args.parameters.clone(),
            systems: args.systems.clone(),
        },
    };
    SweepConfig {
        input,
        guess: (args.guess.x, args.guess.y),
        chi_t_max: args.chi_t_max,
        plot: !args.plot.no_plot,
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export_dir: args.export_dir.clone(),
    }
}

pub fn fit_config_from_args(args: &FitArgs, data_path: PathBuf) -> FitConfig {
    FitConfig {
        data_path,
        params_path: args.parameters.clone(),
        column_order: args.columns,
        gas_constant: args.gas_constant,
        guess: (args.guess.x, args.guess.y),
        grid_step: args.grid_step,
        max_iterations: args.max_iterations,
        trial_failure: args.on_trial_failure,
        plot: !args.plot.no_plot,
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export_fit: args.export.clone(),
        export_series: args.export_series.clone(),
        debug: args.debug,
    }
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        params: ModelParameters::new(args.dh, args.ds, args.w, args.gamma),
        gas_constant: args.gas_constant,
        range: TemperatureRange::new(args.t_start, args.t_end, args.t_step),
        guess: (args.guess.x, args.guess.y),
        chi_t_max: args.chi_t_max,
        noise: args.noise,
        seed: args.seed,
        output: args.output.clone(),
    }
}

/// Rewrite argv so `sco` defaults to `sco fit`.
///
/// Rules:
/// - `sco`                      -> `sco fit`
/// - `sco data.dat ...`         -> `sco fit data.dat ...`
/// - `sco --columns chi-t-first` -> `sco fit --columns chi-t-first`
/// - `sco --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "sweep" | "fit" | "synth" | "plot");
    if is_subcommand {
        return argv;
    }

    // A flag or a bare data path both belong to `fit`.
    argv.insert(1, "fit".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_becomes_fit() {
        assert_eq!(rewrite_args(argv(&["sco"])), argv(&["sco", "fit"]));
        assert_eq!(
            rewrite_args(argv(&["sco", "data.dat"])),
            argv(&["sco", "fit", "data.dat"])
        );
        assert_eq!(
            rewrite_args(argv(&["sco", "--no-plot"])),
            argv(&["sco", "fit", "--no-plot"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for items in [
            &["sco", "sweep", "--dh", "1"][..],
            &["sco", "synth", "-o", "x.dat"][..],
            &["sco", "--help"][..],
            &["sco", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(items)), argv(items));
        }
    }

    #[test]
    fn inline_sweep_config() {
        let cli = Cli::try_parse_from([
            "sco", "sweep", "--dh", "20000", "--ds", "100", "--w", "500", "--gamma", "1000",
            "--name", "Fe2", "--no-plot",
        ])
        .unwrap();
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let config = sweep_config_from_args(&args);
        assert!(!config.plot);
        match config.input {
            SweepInput::Inline {
                name, params, range, ..
            } => {
                assert_eq!(name, "Fe2");
                assert_eq!(params, ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0));
                assert_eq!(range, TemperatureRange::new(100.0, 500.0, 2.0));
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn file_sweep_is_the_default() {
        let cli = Cli::try_parse_from(["sco", "sweep"]).unwrap();
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        match sweep_config_from_args(&args).input {
            SweepInput::Files {
                parameters,
                systems,
            } => {
                assert_eq!(parameters, PathBuf::from("parameters.dat"));
                assert_eq!(systems, PathBuf::from("systems.dat"));
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }
}
