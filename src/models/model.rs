//! Background model evaluation.
//!
//! The fitters rely on two primitive operations per model:
//! - evaluate the model at a single x (used by the solvers)
//! - evaluate it over an output axis (used to build the returned background)

use crate::domain::{GlParams, PowerLawParams};
use crate::error::BackgroundError;
use crate::math::{gauss1d, lorentz1d};

/// `A * x^r`.
pub fn power_law(x: f64, params: PowerLawParams) -> f64 {
    params.log_intercept.exp() * x.powf(params.exponent)
}

/// Evaluate the power law over `pixels`.
///
/// Returns `BackgroundError::Evaluation` if any value is not finite (overflow,
/// `0^r` with `r < 0`, ...).
pub fn power_law_background(pixels: &[f64], params: PowerLawParams) -> Result<Vec<f64>, BackgroundError> {
    let out: Vec<f64> = pixels.iter().map(|&x| power_law(x, params)).collect();
    match out.iter().position(|v| !v.is_finite()) {
        None => Ok(out),
        Some(i) => Err(BackgroundError::Evaluation(format!(
            "A*x^r is {} at x={} (r={:.4}, ln A={:.4})",
            out[i], pixels[i], params.exponent, params.log_intercept
        ))),
    }
}

/// `n * G(x, x0, sigma) + (1 - n) * L(x, x0, w) + C`.
pub fn gauss_lorentz(x: f64, p: &GlParams) -> f64 {
    p.n * gauss1d(x, p.x0, p.sigma) + (1.0 - p.n) * lorentz1d(x, p.x0, p.w) + p.c
}

/// [`gauss_lorentz`] over a raw `(x0, sigma, w, n, C)` slice, for the solver.
///
/// # Panics
/// Panics if `p` has fewer than five entries.
pub fn gauss_lorentz_raw(x: f64, p: &[f64]) -> f64 {
    p[3] * gauss1d(x, p[0], p[1]) + (1.0 - p[3]) * lorentz1d(x, p[0], p[2]) + p[4]
}

/// Evaluate the Gaussian-Lorentz model over `x`.
pub fn gauss_lorentz_curve(x: &[f64], p: &GlParams) -> Vec<f64> {
    x.iter().map(|&xi| gauss_lorentz(xi, p)).collect()
}
