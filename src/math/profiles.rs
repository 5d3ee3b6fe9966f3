//! Peak-normalised line profiles.
//!
//! Both profiles evaluate to exactly 1 at `x = x0`, so the mixing weight `n` in
//! `n * G + (1 - n) * L` is a fraction of peak height:
//!
//! - `G(x; x0, σ) = exp(-(x - x0)^2 / (2 σ^2))`
//! - `L(x; x0, w) = (w/2)^2 / ((x - x0)^2 + (w/2)^2)` with `w` the FWHM

/// Gaussian profile with unit peak height.
pub fn gauss1d(x: f64, x0: f64, sigma: f64) -> f64 {
    let d = x - x0;
    (-(d * d) / (2.0 * sigma * sigma)).exp()
}

/// Lorentzian profile with unit peak height; `w` is the full width at half maximum.
pub fn lorentz1d(x: f64, x0: f64, w: f64) -> f64 {
    let d = x - x0;
    let hw2 = 0.25 * w * w;
    hw2 / (d * d + hw2)
}

/// Vectorised [`gauss1d`].
pub fn gauss1d_slice(x: &[f64], x0: f64, sigma: f64) -> Vec<f64> {
    x.iter().map(|&xi| gauss1d(xi, x0, sigma)).collect()
}

/// Vectorised [`lorentz1d`].
pub fn lorentz1d_slice(x: &[f64], x0: f64, w: f64) -> Vec<f64> {
    x.iter().map(|&xi| lorentz1d(xi, x0, w)).collect()
}
