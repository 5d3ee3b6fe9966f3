//! Mathematical utilities: line profiles, linear and nonlinear least squares.

pub mod lm;
pub mod ols;
pub mod profiles;

pub use lm::*;
pub use ols::*;
pub use profiles::*;
