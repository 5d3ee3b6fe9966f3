//! Ordinary least squares.
//!
//! The power-law background is linear in log-log space:
//!
//! ```text
//! ln y = r ln x + ln A
//! ```
//!
//! so a two-column OLS solve gives the exponent and intercept directly.
//!
//! Implementation choices:
//! - We use SVD so tall design matrices are handled without forming normal
//!   equations. (Nalgebra's `QR::solve` is intended for square systems.)
//! - Non-finite inputs are rejected up front; SVD on `inf`/`NaN` never converges
//!   to anything meaningful.

use nalgebra::{DMatrix, DVector};

use crate::domain::PowerLawParams;
use crate::error::BackgroundError;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `ln y = r ln x + b` by OLS.
///
/// `x` and `y` must be strictly positive; anything whose logarithm is not finite
/// makes the fit fail. A rank-deficient system (one point, or every `x` equal)
/// gets the minimum-norm solution, which still passes through the data.
pub fn fit_log_log(x: &[f64], y: &[f64]) -> Result<PowerLawParams, BackgroundError> {
    if x.len() != y.len() {
        return Err(BackgroundError::Fit(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(BackgroundError::Fit("log-log fit needs at least one point".to_string()));
    }

    let n = x.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    let mut rhs = DVector::<f64>::zeros(n);
    for i in 0..n {
        let lx = x[i].ln();
        let ly = y[i].ln();
        if !(lx.is_finite() && ly.is_finite()) {
            return Err(BackgroundError::Fit(format!(
                "non-finite log value at point {i} (x={}, y={})",
                x[i], y[i]
            )));
        }
        design[(i, 0)] = lx;
        design[(i, 1)] = 1.0;
        rhs[i] = ly;
    }


    let beta = solve_least_squares(&design, &rhs)
        .ok_or_else(|| BackgroundError::Fit("log-log least squares did not produce a solution".to_string()))?;

    Ok(PowerLawParams {
        exponent: beta[0],
        log_intercept: beta[1],
    })
}
