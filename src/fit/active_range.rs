//! Active-range detection.
//!
//! Plateaus where χT does not move (fully low-spin below the transition, fully
//! high-spin above it) carry no information about the parameters and only
//! dilute the objective. The fit is restricted to the samples between the
//! first and the last interval whose slope exceeds a fraction of `χT_max`.

use crate::domain::{ActiveRange, Observation};
use crate::error::ModelError;
use crate::math::forward_differences;

/// Slope threshold as a fraction of `χT_max`, in 1/K.
pub const ACTIVE_SLOPE_FRACTION: f64 = 0.0003;

/// Fewest samples a fit of four parameters is attempted on.
pub const MIN_ACTIVE_SAMPLES: usize = 4;

/// Find the inclusive sample range where `|dχT/dT| > 0.0003·χT_max`.
///
/// `start` is the first interval above threshold, `end` the upper sample of
/// the last one, so both samples bounding every steep interval are included.
pub fn detect_active_range(
    observations: &[Observation],
    chi_t_max: f64,
) -> Result<ActiveRange, ModelError> {
    if !chi_t_max.is_finite() || chi_t_max <= 0.0 {
        return Err(ModelError::invalid(format!(
            "chi_t_max must be finite and positive (got {chi_t_max})"
        )));
    }
    let t: Vec<f64> = observations.iter().map(|o| o.temperature).collect();
    let v: Vec<f64> = observations.iter().map(|o| o.chi_t).collect();
    let slopes = forward_differences(&t, &v);

    let threshold = ACTIVE_SLOPE_FRACTION * chi_t_max;
    let steep = |d: &f64| d.abs() > threshold;
    let (Some(first), Some(last)) = (slopes.iter().position(steep), slopes.iter().rposition(steep))
    else {
        return Err(ModelError::invalid(format!(
            "no transition found: |dχT/dT| never exceeds {threshold:.3e} over {} samples",
            observations.len()
        )));
    };

    let range = ActiveRange {
        start: first,
        end: last + 1,
    };
    if range.len() < MIN_ACTIVE_SAMPLES {
        return Err(ModelError::invalid(format!(
            "active range {}..={} has {} samples; at least {MIN_ACTIVE_SAMPLES} are needed",
            range.start,
            range.end,
            range.len()
        )));
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<Observation> {
        (100..300)
            .map(|t| {
                let t = t as f64;
                let chi_t = if t < 150.0 {
                    0.0
                } else if t < 250.0 {
                    3.0 * (t - 150.0) / 100.0
                } else {
                    3.0
                };
                Observation {
                    temperature: t,
                    chi_t,
                }
            })
            .collect()
    }

    #[test]
    fn brackets_the_ramp() {
        let obs = ramp();
        let range = detect_active_range(&obs, 3.5).unwrap();
        assert_eq!(obs[range.start].temperature, 150.0);
        assert_eq!(obs[range.end].temperature, 250.0);
    }

    #[test]
    fn flat_curve_has_no_active_range() {
        let obs: Vec<Observation> = (0..20)
            .map(|i| Observation {
                temperature: 100.0 + i as f64,
                chi_t: 1.0,
            })
            .collect();
        assert!(matches!(
            detect_active_range(&obs, 3.5),
            Err(ModelError::InvalidInput { .. })
        ));
    }

    #[test]
    fn single_jump_is_too_short() {
        let mut obs: Vec<Observation> = (0..20)
            .map(|i| Observation {
                temperature: 100.0 + i as f64,
                chi_t: 0.0,
            })
            .collect();
        for o in obs.iter_mut().skip(10) {
            o.chi_t = 3.0;
        }
        assert!(matches!(
            detect_active_range(&obs, 3.5),
            Err(ModelError::InvalidInput { .. })
        ));
    }
}
