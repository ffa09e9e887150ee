//! Debug bundle writer for inspecting a parameter fit.
//!
//! The bundle is a Markdown file under `debug/` with the inputs, the
//! optimizer trajectory and the per-sample residuals of one run.

use std::fmt::Write as _;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{FitConfig, FitResult, ModelParameters, Observation};
use crate::error::AppError;

pub fn write_debug_bundle(
    dir: &Path,
    config: &FitConfig,
    observations: &[Observation],
    chi_t_max: f64,
    initial: &ModelParameters,
    result: &FitResult,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create debug dir: {e}")))?;

    let stem = config
        .data_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("sco_debug_{stem}_{ts}.md"));

    let text = render_bundle(config, observations, chi_t_max, initial, result)
        .map_err(|e| AppError::new(2, format!("Failed to format debug bundle: {e}")))?;
    std::fs::write(&path, text)
        .map_err(|e| AppError::new(2, format!("Failed to write debug file: {e}")))?;
    Ok(path)
}

fn render_bundle(
    config: &FitConfig,
    observations: &[Observation],
    chi_t_max: f64,
    initial: &ModelParameters,
    result: &FitResult,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let range = result.active_range;

    writeln!(out, "# sco debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- data: {}", config.data_path.display())?;
    writeln!(out, "- parameters: {}", config.params_path.display())?;
    writeln!(out, "- column_order: {:?}", config.column_order)?;
    writeln!(out, "- gas_constant: {}", config.gas_constant)?;
    writeln!(out, "- chi_t_max: {chi_t_max}")?;
    writeln!(out, "- guess: x={:e}, y={:e}", config.guess.0, config.guess.1)?;
    writeln!(out, "- trial_failure: {:?}", config.trial_failure)?;
    writeln!(
        out,
        "- active_range: {}..={} (T = {} .. {} K, n={})",
        range.start,
        range.end,
        observations[range.start].temperature,
        observations[range.end].temperature,
        range.len()
    )?;

    writeln!(out, "\n## Trajectory")?;
    writeln!(out, "| iter | damping | cost | dH | dS | W | gamma |")?;
    writeln!(out, "| - | - | - | - | - | - | - |")?;
    writeln!(
        out,
        "| 0 | - | - | {:.6} | {:.6} | {:.6} | {:.6} |",
        initial.dh, initial.ds, initial.w, initial.gamma
    )?;
    for rec in &result.history {
        writeln!(
            out,
            "| {} | {:.1e} | {:.6e} | {:.6} | {:.6} | {:.6} | {:.6} |",
            rec.iteration,
            rec.damping,
            rec.cost,
            rec.params.dh,
            rec.params.ds,
            rec.params.w,
            rec.params.gamma
        )?;
    }

    writeln!(out, "\n## Result")?;
    writeln!(out, "- termination: {:?}", result.termination)?;
    writeln!(
        out,
        "- iterations: {}, sweeps: {}, penalized trials: {}",
        result.iterations, result.evaluations, result.penalized_trials
    )?;
    writeln!(out, "- cost: {:.6e}, rmse: {:.6e}", result.cost, result.rmse)?;

    writeln!(out, "\n## Residuals")?;
    writeln!(out, "| T | chi_t_obs | chi_t_fit | residual |")?;
    writeln!(out, "| - | - | - | - |")?;
    for (o, r) in range.slice(observations).iter().zip(&result.residuals) {
        writeln!(
            out,
            "| {:.3} | {:.8} | {:.8} | {:.3e} |",
            o.temperature,
            o.chi_t,
            o.chi_t + r,
            r
        )?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ActiveRange, ColumnOrder, IterationRecord, LOW_SPIN_GUESS, Termination, TrialFailurePolicy,
    };

    #[test]
    fn bundle_contains_trajectory_and_residuals() {
        let observations: Vec<Observation> = (0..5)
            .map(|i| Observation {
                temperature: 100.0 + i as f64,
                chi_t: i as f64,
            })
            .collect();
        let params = ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0);
        let result = FitResult {
            params,
            residuals: vec![0.1, -0.1, 0.0],
            cost: 0.02,
            rmse: 0.08,
            iterations: 1,
            evaluations: 6,
            penalized_trials: 0,
            termination: Termination::CostTolerance,
            active_range: ActiveRange { start: 1, end: 3 },
            history: vec![IterationRecord {
                iteration: 1,
                damping: 1e-4,
                cost: 0.02,
                params,
            }],
        };
        let config = FitConfig {
            data_path: "data.dat".into(),
            params_path: "parameters.dat".into(),
            column_order: ColumnOrder::ChiTFirst,
            gas_constant: 8.31,
            guess: LOW_SPIN_GUESS,
            grid_step: 0.1,
            max_iterations: 200,
            trial_failure: TrialFailurePolicy::Penalize,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_fit: None,
            export_series: None,
            debug: true,
        };

        let text = render_bundle(&config, &observations, 3.5, &params, &result).unwrap();
        assert!(text.contains("- active_range: 1..=3 (T = 101 .. 103 K, n=3)"));
        assert!(text.contains("| 1 | 1.0e-4 |"));
        assert_eq!(text.matches("\n| 10").count(), 3);
    }
}
