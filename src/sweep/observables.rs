//! Observables derived from a finished temperature series.

use serde::Serialize;

use crate::domain::{HeatCapacityPoint, TemperatureSeries};
use crate::math::forward_differences;
use crate::models::GibbsModel;

/// One row of the exported per-temperature table.
///
/// `heat_capacity` is defined on the interval starting at this temperature,
/// so the last row has none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    pub temperature: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub c: f64,
    pub chi_t: f64,
    pub enthalpy: f64,
    pub heat_capacity: Option<f64>,
}

impl TemperatureSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// High-spin fraction `c = (y + 2z)/2` at each temperature.
    pub fn high_spin_fractions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.high_spin_fraction()).collect()
    }

    /// `χT = c · χT_max` at each temperature.
    pub fn chi_t(&self, chi_t_max: f64) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.high_spin_fraction() * chi_t_max)
            .collect()
    }

    pub fn enthalpies(&self, model: &GibbsModel) -> Vec<f64> {
        self.points.iter().map(|p| model.enthalpy(p)).collect()
    }

    /// First-difference heat capacity, one value per sampling interval.
    pub fn heat_capacity(&self, model: &GibbsModel) -> Vec<HeatCapacityPoint> {
        let h = self.enthalpies(model);
        forward_differences(&self.temperatures, &h)
            .into_iter()
            .zip(&self.temperatures)
            .map(|(cp, &temperature)| HeatCapacityPoint { temperature, cp })
            .collect()
    }

    pub fn rows(&self, model: &GibbsModel, chi_t_max: f64) -> Vec<SeriesRow> {
        let h = self.enthalpies(model);
        let cp = self.heat_capacity(model);
        self.temperatures
            .iter()
            .zip(&self.points)
            .enumerate()
            .map(|(i, (&temperature, p))| {
                let c = p.high_spin_fraction();
                SeriesRow {
                    temperature,
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    c,
                    chi_t: c * chi_t_max,
                    enthalpy: h[i],
                    heat_capacity: cp.get(i).map(|v| v.cp),
                }
            })
            .collect()
    }
}
