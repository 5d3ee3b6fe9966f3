//! Reporting utilities: formatted terminal output for fit results.

pub mod format;

pub use format::*;
