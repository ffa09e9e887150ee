//! End-to-end behaviour of the numerical core through the public API.

use sco_model::domain::{
    EquilibriumPoint, GAS_CONSTANT, LOW_SPIN_GUESS, ModelParameters, Observation,
    TemperatureRange, Transition,
};
use sco_model::error::ModelError;
use sco_model::fit::{ParameterFitter, detect_active_range};
use sco_model::solver::EquilibriumSolver;
use sco_model::sweep::{TemperatureSweep, locate_transitions};

fn two_step_system() -> ModelParameters {
    ModelParameters::new(55_732.666, 162.3721, -921.98, 5_000.0)
}

fn low_spin() -> EquilibriumPoint {
    EquilibriumPoint::from_xy(LOW_SPIN_GUESS.0, LOW_SPIN_GUESS.1).unwrap()
}

#[test]
fn two_step_system_reports_both_heat_capacity_maxima() {
    let params = two_step_system();
    let grid = TemperatureRange::new(100.0, 500.0, 2.0).grid().unwrap();
    let sweep = TemperatureSweep::new(params, GAS_CONSTANT);
    let series = sweep.run(&grid, &low_spin()).unwrap();
    assert_eq!(series.len(), 200);

    let cp = series.heat_capacity(sweep.solver().model());
    assert_eq!(cp.len(), 199);

    match locate_transitions(&params, &cp).unwrap() {
        Transition::TwoStep {
            t_half,
            lower,
            upper,
        } => {
            assert_eq!(t_half, 343.0);
            assert!(lower > 300.0 && lower < 343.0, "lower = {lower}");
            assert!(upper > 343.0 && upper < 400.0, "upper = {upper}");
        }
        other => panic!("expected a two-step transition, got {other:?}"),
    }
}

#[test]
fn converged_points_satisfy_both_stationarity_conditions() {
    let params = two_step_system();
    let grid = TemperatureRange::new(100.0, 500.0, 2.0).grid().unwrap();
    let sweep = TemperatureSweep::new(params, GAS_CONSTANT);
    let series = sweep.run(&grid, &low_spin()).unwrap();
    let model = sweep.solver().model();

    for (&t, p) in series.temperatures.iter().zip(&series.points) {
        assert!(p.x > 0.0 && p.x < 1.0);
        assert!(p.y > 0.0 && p.y < 1.0);
        assert!(p.z > 0.0 && p.z < 1.0);
        assert!((p.x + p.y + p.z - 1.0).abs() < 1e-12);

        let [f1, f2] = model.stationarity(t, p);
        let rt = GAS_CONSTANT * t;
        assert!((f1 / rt).abs() < 1e-6, "eq1 at T = {t}: {f1}");
        assert!((f2 / rt).abs() < 1e-6, "eq2 at T = {t}: {f2}");
    }
}

#[test]
fn one_step_trajectory_is_continuous() {
    let params = ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0);
    let grid = TemperatureRange::new(100.0, 400.0, 1.0).grid().unwrap();
    let sweep = TemperatureSweep::new(params, GAS_CONSTANT);
    let series = sweep.run(&grid, &low_spin()).unwrap();

    let xs: Vec<f64> = series.points.iter().map(|p| p.x).collect();
    for w in xs.windows(2) {
        assert!((w[1] - w[0]).abs() < 0.05, "jump {} -> {}", w[0], w[1]);
        assert!(w[1] <= w[0] + 1e-12);
    }
    let cp = series.heat_capacity(sweep.solver().model());
    assert_eq!(
        locate_transitions(&params, &cp).unwrap(),
        Transition::OneStep { t_half: 200.0 }
    );
}

#[test]
fn fit_recovers_parameters_of_a_synthetic_curve() {
    let truth = ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0);
    let fitter = ParameterFitter::new(3.5, GAS_CONSTANT);
    let grid = TemperatureRange::new(100.0, 400.0, 2.0).grid().unwrap();
    let observations: Vec<Observation> = grid
        .iter()
        .copied()
        .zip(fitter.predict(&truth, &grid).unwrap())
        .map(|(temperature, chi_t)| Observation {
            temperature,
            chi_t,
        })
        .collect();

    let result = fitter
        .fit(&observations, ModelParameters::new(22_000.0, 105.0, 300.0, 800.0))
        .unwrap();
    for (got, want) in result.params.to_array().iter().zip(truth.to_array()) {
        assert!(((got - want) / want).abs() < 1e-3, "got {got}, want {want}");
    }
    assert_eq!(result.penalized_trials, 0);
}

#[test]
fn active_range_brackets_the_changing_window() {
    // Flat at 0.5 up to 150 K, linear to 3.0 at 250 K, flat afterwards.
    let observations: Vec<Observation> = (0..=60)
        .map(|i| {
            let t = 100.0 + 5.0 * i as f64;
            let chi_t = 0.5 + 2.5 * ((t - 150.0) / 100.0).clamp(0.0, 1.0);
            Observation {
                temperature: t,
                chi_t,
            }
        })
        .collect();

    let range = detect_active_range(&observations, 3.5).unwrap();
    assert_eq!(observations[range.start].temperature, 150.0);
    assert_eq!(observations[range.end].temperature, 250.0);
}

#[test]
fn zero_temperature_and_pure_guesses_are_rejected() {
    let solver = EquilibriumSolver::new(two_step_system(), GAS_CONSTANT);

    let err = solver.solve(0.0, &low_spin()).unwrap_err();
    assert!(matches!(err, ModelError::InvalidInput { .. }), "{err:?}");

    for (x, y) in [(0.0, 0.5), (0.5, 0.0), (1.0, 0.0)] {
        let err = solver.solve_from_xy(300.0, x, y).unwrap_err();
        assert!(
            matches!(
                err,
                ModelError::InvalidInput { .. } | ModelError::NonConvergence { .. }
            ),
            "({x}, {y}) gave {err:?}"
        );
    }
}
