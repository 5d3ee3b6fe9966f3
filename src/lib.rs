//! `eels-background` library crate.
//!
//! The binary (`eelsbg`) is a thin wrapper around this library so that:
//!
//! - the fitters are testable without spawning processes
//! - `fit_power_law` and `fit_gauss_lorentz` can be called directly on in-memory spectra
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

pub use domain::{GaussLorentzFit, GlParams, PixelRange, PowerLawFit, PowerLawParams};
pub use error::{AppError, BackgroundError};
pub use fit::{fit_gauss_lorentz, fit_power_law};
