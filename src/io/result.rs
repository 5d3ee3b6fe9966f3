//! Read/write result JSON files.
//!
//! A result file is the portable representation of one background fit:
//! - model kind + fitted parameters (and uncertainties / solver stats for GL)
//! - the source spectrum and a generation timestamp
//! - the evaluated grid (signal, background, subtracted) for quick plotting
//!
//! The schema is defined by `domain::BackgroundFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::BackgroundFile;
use crate::error::AppError;

/// Write a result JSON file.
///
/// JSON has no encoding for `NaN`/`inf`, so a grid holding one is refused rather
/// than written as `null`.
pub fn write_result_json(path: &Path, result: &BackgroundFile) -> Result<(), AppError> {
    let grid = &result.grid;
    let columns = [
        ("x", &grid.x),
        ("signal", &grid.signal),
        ("background", &grid.background),
        ("subtracted", &grid.subtracted),
    ];
    for (name, column) in columns {
        if let Some(i) = column.iter().position(|v| !v.is_finite()) {
            return Err(AppError::new(
                4,
                format!("Refusing to write result JSON: {name}[{i}] is {}", column[i]),
            ));
        }
    }

    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display())))?;

    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, result)
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;

    Ok(())
}

/// Read a result JSON file.
pub fn read_result_json(path: &Path) -> Result<BackgroundFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open result JSON '{}': {e}", path.display())))?;
    let result: BackgroundFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid result JSON: {e}")))?;

    if result.grid.x.len() != result.grid.background.len()
        || result.grid.x.len() != result.grid.signal.len()
        || result.grid.x.len() != result.grid.subtracted.len()
    {
        return Err(AppError::new(2, "Invalid result JSON: grid columns differ in length."));
    }
    Ok(result)
}
