//! Background fitting.
//!
//! Responsibilities:
//!
//! - power-law fit + extrapolation for core-loss spectra
//! - Gaussian-Lorentz fit + subtraction for low-loss spectra

pub mod gauss_lorentz;
pub mod power_law;

pub use gauss_lorentz::*;
pub use power_law::*;
