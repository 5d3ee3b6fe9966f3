//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - fitting inputs (`PixelRange`, `GlParams`, `Spectrum`)
//! - fit outputs (`PowerLawFit`, `GaussLorentzFit`, `SolverReport`)
//! - run configuration and the saved result schema (`BackgroundFile`)

pub mod types;

pub use types::*;
