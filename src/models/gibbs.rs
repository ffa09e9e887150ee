//! Stationarity conditions of the SS/SQ/QQ free-energy surface.
//!
//! Two coordinate systems are exposed:
//! - `(x, y)`: the molar fractions of SS and SQ, with `z = 1 - x - y` for QQ
//! - `(a, b) = (ln(x/z), ln(y/z))`: log-ratio coordinates used by the solver
//!
//! In log-ratio coordinates every finite iterate maps strictly inside the
//! simplex, so `ln` is never evaluated outside its domain.

use crate::domain::{EquilibriumPoint, ModelParameters};

/// Free-energy surface for one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GibbsModel {
    pub params: ModelParameters,
    pub gas_constant: f64,
}

impl GibbsModel {
    pub fn new(params: ModelParameters, gas_constant: f64) -> Self {
        Self {
            params,
            gas_constant,
        }
    }

    /// `R·T`, the natural scale of both equations.
    pub fn thermal_energy(&self, t: f64) -> f64 {
        self.gas_constant * t
    }

    /// `(eq1, eq2)` evaluated at `p`.
    ///
    /// `p.z` is used for `1 - x - y` so the result stays meaningful when `z`
    /// is below double precision relative to 1.
    pub fn stationarity(&self, t: f64, p: &EquilibriumPoint) -> [f64; 2] {
        let rt = self.thermal_energy(t);
        let ln_z = p.z.ln();
        self.residual_from_logs(t, rt * (p.x.ln() - ln_z), rt * (p.y.ln() - ln_z), p)
    }

    /// Analytic Jacobian of `(eq1, eq2)` with respect to `(x, y)`.
    pub fn jacobian(&self, t: f64, p: &EquilibriumPoint) -> [[f64; 2]; 2] {
        let rt = self.thermal_energy(t);
        let g = self.params.gamma;
        let inv_z = rt / p.z;
        [
            [rt / p.x + inv_z - 4.0 * g, inv_z - 2.0 * g],
            [inv_z - 2.0 * g, rt / p.y + inv_z - 2.0 * g],
        ]
    }

    /// `(eq1, eq2)` expressed in log-ratio coordinates.
    ///
    /// `(a, b)` supply the logarithmic terms exactly; `p` must be the
    /// composition obtained from them via [`EquilibriumPoint::from_log_ratios`].
    pub fn log_ratio_residual(&self, t: f64, a: f64, b: f64, p: &EquilibriumPoint) -> [f64; 2] {
        let rt = self.thermal_energy(t);
        self.residual_from_logs(t, rt * a, rt * b, p)
    }

    /// Jacobian of [`Self::log_ratio_residual`] with respect to `(a, b)`.
    ///
    /// Equal to `J_xy · S` where `S` is the Jacobian of the softmax map
    /// `(a, b) -> (x, y)`; written out here in the cancellation-free form.
    pub fn log_ratio_jacobian(&self, t: f64, p: &EquilibriumPoint) -> [[f64; 2]; 2] {
        let rt = self.thermal_energy(t);
        let g2 = 2.0 * self.params.gamma;
        let (x, y, z) = (p.x, p.y, p.z);
        [
            [rt - g2 * x * (y + 2.0 * z), g2 * y * (x - z)],
            [-g2 * x * z, rt - g2 * y * z],
        ]
    }

    /// Molar enthalpy `H = y(dH/2 + W) + z·dH + gamma(xy + yz + 2zx)`.
    pub fn enthalpy(&self, p: &EquilibriumPoint) -> f64 {
        let ModelParameters { dh, w, gamma, .. } = self.params;
        p.y * (dh / 2.0 + w) + p.z * dh + gamma * (p.x * p.y + p.y * p.z + 2.0 * p.z * p.x)
    }

    fn residual_from_logs(&self, t: f64, rt_a: f64, rt_b: f64, p: &EquilibriumPoint) -> [f64; 2] {
        let ModelParameters { dh, ds, w, gamma } = self.params;
        let (x, y) = (p.x, p.y);
        [
            rt_a + ds * t - dh - 2.0 * gamma * (2.0 * x + y - 1.0),
            rt_b + ds * t / 2.0 + w - dh / 2.0 + gamma * (1.0 - 2.0 * y - 2.0 * x),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GAS_CONSTANT;

    fn model() -> GibbsModel {
        GibbsModel::new(
            ModelParameters::new(55_732.666, 162.3721, -921.98, 5_000.0),
            GAS_CONSTANT,
        )
    }

    #[test]
    fn analytic_jacobian_matches_finite_differences() {
        let m = model();
        let t = 330.0;
        let p = EquilibriumPoint::from_xy(0.3, 0.45).unwrap();
        let j = m.jacobian(t, &p);
        let h = 1e-7;
        for (col, (dx, dy)) in [(h, 0.0), (0.0, h)].into_iter().enumerate() {
            let plus = m.stationarity(t, &EquilibriumPoint::from_xy(p.x + dx, p.y + dy).unwrap());
            let minus = m.stationarity(t, &EquilibriumPoint::from_xy(p.x - dx, p.y - dy).unwrap());
            for row in 0..2 {
                let fd = (plus[row] - minus[row]) / (2.0 * h);
                assert!(
                    (fd - j[row][col]).abs() < 1e-4 * j[row][col].abs().max(1.0),
                    "J[{row}][{col}]: analytic {} vs fd {fd}",
                    j[row][col]
                );
            }
        }
    }

    #[test]
    fn log_ratio_jacobian_is_chain_rule_of_xy_jacobian() {
        let m = model();
        let t = 345.0;
        let p = EquilibriumPoint::from_xy(0.2, 0.5).unwrap();
        let j = m.jacobian(t, &p);
        let s = [
            [p.x * (1.0 - p.x), -p.x * p.y],
            [-p.x * p.y, p.y * (1.0 - p.y)],
        ];
        let lr = m.log_ratio_jacobian(t, &p);
        for row in 0..2 {
            for col in 0..2 {
                let chained = j[row][0] * s[0][col] + j[row][1] * s[1][col];
                assert!((chained - lr[row][col]).abs() < 1e-8 * chained.abs().max(1.0));
            }
        }
    }

    #[test]
    fn both_coordinate_systems_agree_on_residual() {
        let m = model();
        let p = EquilibriumPoint::from_xy(0.6, 0.25).unwrap();
        let (a, b) = p.log_ratios();
        let direct = m.stationarity(300.0, &p);
        let via_logs = m.log_ratio_residual(300.0, a, b, &p);
        assert!((direct[0] - via_logs[0]).abs() < 1e-8);
        assert!((direct[1] - via_logs[1]).abs() < 1e-8);
    }

    #[test]
    fn enthalpy_of_pure_states() {
        let m = model();
        let ss = EquilibriumPoint { x: 1.0, y: 0.0, z: 0.0 };
        let qq = EquilibriumPoint { x: 0.0, y: 0.0, z: 1.0 };
        assert_eq!(m.enthalpy(&ss), 0.0);
        assert!((m.enthalpy(&qq) - 55_732.666).abs() < 1e-9);
    }
}
