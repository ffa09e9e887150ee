//! Linear least squares solver.
//!
//! The parameter fitter repeatedly solves a small damped problem of the form:
//!
//! ```text
//! minimize |J δ + r|² + λ Σ d_j δ_j²
//! ```
//!
//! which is an ordinary least squares problem on the augmented system
//! `[J; sqrt(λ D)] δ = [-r; 0]`.
//!
//! Implementation choices:
//! - SVD handles the tall augmented matrix directly and degrades gracefully
//!   when columns are nearly collinear (dS and dH are strongly correlated
//!   through `T½ = dH/dS`).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is 4, so SVD cost is negligible next to a
//!   forward temperature sweep.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the damped step `[J; sqrt(λ·diag)] δ = [-r; 0]`.
///
/// `scale` holds the per-parameter damping weights `d_j`.
pub fn solve_damped_step(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    scale: &DVector<f64>,
    damping: f64,
) -> Option<DVector<f64>> {
    let (m, n) = jacobian.shape();
    let mut augmented = DMatrix::<f64>::zeros(m + n, n);
    augmented.view_mut((0, 0), (m, n)).copy_from(jacobian);
    for j in 0..n {
        augmented[(m + j, j)] = (damping * scale[j]).sqrt();
    }

    let mut rhs = DVector::<f64>::zeros(m + n);
    rhs.rows_mut(0, m).copy_from(&(-residuals));

    solve_least_squares(&augmented, &rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damped_step_shrinks_towards_zero() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[-2.0, -5.0, -8.0]);
        let scale = DVector::from_element(2, 1.0);

        let free = solve_damped_step(&j, &r, &scale, 0.0).unwrap();
        assert!((free[0] - 2.0).abs() < 1e-10);
        assert!((free[1] - 3.0).abs() < 1e-10);

        let damped = solve_damped_step(&j, &r, &scale, 1e3).unwrap();
        assert!(damped.norm() < free.norm());
    }
}
