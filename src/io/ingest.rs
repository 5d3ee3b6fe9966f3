//! CSV spectrum ingest.
//!
//! A spectrum file is a CSV with a header row:
//!
//! - intensity column: `intensity`, `counts` or `signal` (required)
//! - energy column: `energy`, `energy_loss` or `ev` (optional)
//!
//! Rows map one-to-one onto pixels, so unlike a tabular ingest a bad row is fatal:
//! skipping it would shift every later channel. `NaN` and `inf` count as bad values.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::info;

use crate::domain::Spectrum;
use crate::error::AppError;

const INTENSITY_COLUMNS: [&str; 3] = ["intensity", "counts", "signal"];
const ENERGY_COLUMNS: [&str; 3] = ["energy", "energy_loss", "ev"];

/// Load a spectrum from a CSV file.
pub fn load_spectrum(path: &Path) -> Result<Spectrum, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open spectrum '{}': {e}", path.display())))?;
    let mut spectrum = read_spectrum(file).map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    spectrum.source = path.to_path_buf();
    info!(
        "loaded {} channels from {} (energy axis: {})",
        spectrum.len(),
        path.display(),
        if spectrum.has_energy_axis { "yes" } else { "pixel index" }
    );
    Ok(spectrum)
}

/// Parse a spectrum from any reader; `source` is left empty.
pub fn read_spectrum<R: Read>(reader: R) -> Result<Spectrum, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let intensity_idx = find_column(&header_map, &INTENSITY_COLUMNS).ok_or_else(|| {
        AppError::new(
            2,
            format!("Missing intensity column (one of: {})", INTENSITY_COLUMNS.join(", ")),
        )
    })?;
    let energy_idx = find_column(&header_map, &ENERGY_COLUMNS);

    let mut energy = Vec::new();
    let mut intensity = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("line {line}: CSV parse error: {e}")))?;

        intensity.push(parse_field(&record, intensity_idx, "intensity", line)?);
        if let Some(ei) = energy_idx {
            energy.push(parse_field(&record, ei, "energy", line)?);
        }
    }

    if intensity.is_empty() {
        return Err(AppError::new(3, "Spectrum has no data rows."));
    }

    let has_energy_axis = energy_idx.is_some();
    if !has_energy_axis {
        energy = (0..intensity.len()).map(|i| i as f64).collect();
    }

    Ok(Spectrum {
        source: Default::default(),
        energy,
        intensity,
        has_energy_axis,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn parse_field(record: &StringRecord, idx: usize, what: &str, line: usize) -> Result<f64, AppError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| AppError::new(2, format!("line {line}: missing {what} value")))?;
    let value = raw
        .parse::<f64>()
        .map_err(|e| AppError::new(2, format!("line {line}: invalid {what} value '{raw}': {e}")))?;
    if !value.is_finite() {
        return Err(AppError::new(2, format!("line {line}: non-finite {what} value '{raw}'")));
    }
    Ok(value)
}
