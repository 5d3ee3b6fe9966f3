//! Background model implementations.
//!
//! Models are small, pure functions so the fitters and the reporting code can
//! share them.

pub mod model;

pub use model::*;
