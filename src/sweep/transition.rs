//! Transition temperatures.
//!
//! `T½ = dH/dS` (truncated to whole kelvin) always exists. When `W < 0` the
//! mixed SQ state is stabilised and the transition splits in two steps; each
//! step shows up as a maximum of the heat capacity, one on each side of `T½`.

use crate::domain::{HeatCapacityPoint, ModelParameters, Transition};
use crate::error::ModelError;
use crate::math::{interp_linear, maximize_bounded};

/// Bracket width at which the peak search stops, K.
pub const PEAK_TOLERANCE: f64 = 1e-5;

/// Locate the transition temperature(s) of `params` from a heat-capacity curve.
///
/// For two-step systems the maxima are searched on a piecewise-linear
/// interpolation of `cp` within `(T_first, T½)` and `(T½, T_last)`.
pub fn locate_transitions(
    params: &ModelParameters,
    cp: &[HeatCapacityPoint],
) -> Result<Transition, ModelError> {
    params.validate()?;
    let t_half = params.half_transition_temperature().trunc();
    if !t_half.is_finite() {
        return Err(ModelError::invalid(format!(
            "half-transition temperature dH/dS is undefined (dH={}, dS={})",
            params.dh, params.ds
        )));
    }

    if !params.is_two_step() {
        return Ok(Transition::OneStep { t_half });
    }

    if cp.len() < 2 {
        return Err(ModelError::invalid(
            "two-step transition search needs at least two heat-capacity samples",
        ));
    }
    let ts: Vec<f64> = cp.iter().map(|p| p.temperature).collect();
    let values: Vec<f64> = cp.iter().map(|p| p.cp).collect();
    let (first, last) = (ts[0], ts[ts.len() - 1]);
    if !(first < t_half && t_half < last) {
        return Err(ModelError::invalid(format!(
            "T½ = {t_half} K lies outside the swept range ({first} K, {last} K)"
        )));
    }

    let curve = |t: f64| interp_linear(t, &ts, &values);
    let lower = maximize_bounded(curve, first, t_half, PEAK_TOLERANCE);
    let upper = maximize_bounded(curve, t_half, last, PEAK_TOLERANCE);

    Ok(Transition::TwoStep {
        t_half,
        lower,
        upper,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bumps() -> Vec<HeatCapacityPoint> {
        (0..=40)
            .map(|i| {
                let t = 100.0 + 5.0 * i as f64;
                let cp = (-(t - 160.0).powi(2) / 200.0).exp()
                    + 2.0 * (-(t - 250.0).powi(2) / 200.0).exp();
                HeatCapacityPoint { temperature: t, cp }
            })
            .collect()
    }

    #[test]
    fn one_step_reports_truncated_half_temperature() {
        let params = ModelParameters::new(20_050.0, 100.0, 10.0, 0.0);
        let tr = locate_transitions(&params, &[]).unwrap();
        assert_eq!(tr, Transition::OneStep { t_half: 200.0 });
    }

    #[test]
    fn two_step_finds_peak_on_each_side() {
        let params = ModelParameters::new(20_000.0, 100.0, -10.0, 0.0);
        match locate_transitions(&params, &two_bumps()).unwrap() {
            Transition::TwoStep {
                t_half,
                lower,
                upper,
            } => {
                assert_eq!(t_half, 200.0);
                assert!((lower - 160.0).abs() < 1e-3, "lower = {lower}");
                assert!((upper - 250.0).abs() < 1e-3, "upper = {upper}");
            }
            other => panic!("expected two steps, got {other:?}"),
        }
    }

    #[test]
    fn two_step_needs_half_temperature_inside_range() {
        let params = ModelParameters::new(50_000.0, 100.0, -10.0, 0.0);
        assert!(matches!(
            locate_transitions(&params, &two_bumps()),
            Err(ModelError::InvalidInput { .. })
        ));
    }
}
