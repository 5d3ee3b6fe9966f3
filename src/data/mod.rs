//! Synthetic input data.

pub mod synthetic;

pub use synthetic::*;
