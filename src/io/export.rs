//! Export the evaluated background grid to CSV.
//!
//! One row per channel of the output span, easy to load in a spreadsheet or
//! plotting script.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{AxisUnit, BackgroundGrid};
use crate::error::AppError;

/// Write `x, signal, background, subtracted` rows to `path`.
pub fn write_background_csv(path: &Path, grid: &BackgroundGrid) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_grid(&mut out, grid)
        .and_then(|_| out.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))
}

/// Write an `energy,intensity` spectrum that `load_spectrum` can read back.
pub fn write_spectrum_csv(path: &Path, energy: &[f64], intensity: &[f64]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create spectrum CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_spectrum(&mut out, energy, intensity)
        .and_then(|_| out.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write spectrum CSV '{}': {e}", path.display())))
}

fn write_spectrum<W: Write>(out: &mut W, energy: &[f64], intensity: &[f64]) -> std::io::Result<()> {
    writeln!(out, "energy,intensity")?;
    for (e, v) in energy.iter().zip(intensity) {
        writeln!(out, "{e},{v}")?;
    }
    Ok(())
}

fn write_grid<W: Write>(out: &mut W, grid: &BackgroundGrid) -> std::io::Result<()> {
    let x_name = match grid.x_unit {
        AxisUnit::Pixel => "pixel",
        AxisUnit::Ev => "energy_ev",
    };
    writeln!(out, "{x_name},signal,background,subtracted")?;
    for i in 0..grid.x.len() {
        writeln!(
            out,
            "{},{},{},{}",
            grid.x[i], grid.signal[i], grid.background[i], grid.subtracted[i]
        )?;
    }
    Ok(())
}
