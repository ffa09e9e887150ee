//! Synthetic χT(T) curves from known parameters.
//!
//! Used to exercise the fitter end to end: sweep the forward model, then add
//! seeded Gaussian noise proportional to `χT_max`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{EquilibriumPoint, Observation, SynthConfig};
use crate::error::ModelError;
use crate::sweep::TemperatureSweep;

pub fn generate_observations(config: &SynthConfig) -> Result<Vec<Observation>, ModelError> {
    if !config.noise.is_finite() || config.noise < 0.0 {
        return Err(ModelError::invalid(format!(
            "noise level must be finite and non-negative (got {})",
            config.noise
        )));
    }
    if !config.chi_t_max.is_finite() || config.chi_t_max <= 0.0 {
        return Err(ModelError::invalid(format!(
            "chi_t_max must be finite and positive (got {})",
            config.chi_t_max
        )));
    }

    let grid = config.range.grid()?;
    let guess = EquilibriumPoint::from_xy(config.guess.0, config.guess.1)?;
    let series = TemperatureSweep::new(config.params, config.gas_constant).run(&grid, &guess)?;
    let clean = series.chi_t(config.chi_t_max);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let sigma = config.noise * config.chi_t_max;
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| ModelError::invalid(format!("noise distribution error: {e}")))?;

    Ok(grid
        .into_iter()
        .zip(clean)
        .map(|(temperature, chi_t)| {
            let noise = if sigma > 0.0 { rng.sample(normal) } else { 0.0 };
            Observation {
                temperature,
                chi_t: chi_t + noise,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GAS_CONSTANT, LOW_SPIN_GUESS, ModelParameters, TemperatureRange};

    fn config(noise: f64, seed: u64) -> SynthConfig {
        SynthConfig {
            params: ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0),
            gas_constant: GAS_CONSTANT,
            range: TemperatureRange::new(100.0, 300.0, 5.0),
            guess: LOW_SPIN_GUESS,
            chi_t_max: 3.5,
            noise,
            seed,
            output: "unused.dat".into(),
        }
    }

    #[test]
    fn same_seed_same_curve() {
        let a = generate_observations(&config(0.01, 7)).unwrap();
        let b = generate_observations(&config(0.01, 7)).unwrap();
        let c = generate_observations(&config(0.01, 8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn noise_free_curve_rises_to_chi_t_max() {
        let obs = generate_observations(&config(0.0, 1)).unwrap();
        assert!(obs[0].chi_t < 1e-2);
        assert!(obs[obs.len() - 1].chi_t > 3.0);
        assert!(obs.windows(2).all(|w| w[1].chi_t >= w[0].chi_t));
    }

    #[test]
    fn negative_noise_is_invalid() {
        assert!(matches!(
            generate_observations(&config(-0.1, 1)),
            Err(ModelError::InvalidInput { .. })
        ));
    }
}
