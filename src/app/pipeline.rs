//! Shared "fit pipeline" logic used by every fit command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load spectrum -> fit background -> evaluated grid -> result file
//!
//! The command handlers can then focus on presentation (printing, plots, exports).

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use rayon::prelude::*;

use crate::domain::{
    AxisUnit, BackgroundFile, BackgroundGrid, BackgroundModel, GaussLorentzFit, PixelRange, PowerLawFit,
    Spectrum, ZeroLossConfig,
};
use crate::error::AppError;
use crate::fit::{GaussLorentzOptions, fit_gauss_lorentz_with, fit_power_law};
use crate::io::load_spectrum;

/// Tool name recorded in result files.
pub const TOOL_NAME: &str = "eelsbg";

/// All computed outputs for one input spectrum.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub spectrum: Spectrum,
    pub result: BackgroundFile,
}

/// Run `run_one` over every input in parallel. Results follow input order.
pub fn run_batch<F>(inputs: &[PathBuf], run_one: F) -> Vec<Result<RunOutput, AppError>>
where
    F: Fn(&Path) -> Result<RunOutput, AppError> + Sync,
{
    inputs
        .par_iter()
        .map(|path| {
            run_one(path).map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
        })
        .collect()
}

/// Load a spectrum and fit a power-law background over `range`.
pub fn run_power_law(path: &Path, range: PixelRange) -> Result<RunOutput, AppError> {
    let spectrum = load_spectrum(path)?;
    let fit = fit_power_law(&spectrum.intensity, range)?;
    info!(
        "{}: power law r={:.4} over pixels {range}",
        spectrum.label(),
        fit.params.exponent
    );
    let result = power_law_result(&spectrum, &fit);
    Ok(RunOutput { spectrum, result })
}

/// Load a spectrum and fit a Gaussian-Lorentz background over the pre/post windows.
pub fn run_zero_loss(path: &Path, config: &ZeroLossConfig) -> Result<RunOutput, AppError> {
    let spectrum = load_spectrum(path)?;
    if !spectrum.has_energy_axis {
        warn!(
            "{} has no energy column; fitting against pixel indices",
            spectrum.label()
        );
    }

    let options = GaussLorentzOptions {
        initial: config.initial,
        max_evaluations: config.max_evaluations,
    };
    let fit = fit_gauss_lorentz_with(&spectrum.energy, &spectrum.intensity, config.pre, config.post, &options)?;
    info!(
        "{}: zero-loss peak at {:.4} after {} evaluations",
        spectrum.label(),
        fit.params.x0,
        fit.report.evaluations
    );
    let result = gauss_lorentz_result(&spectrum, &fit);
    Ok(RunOutput { spectrum, result })
}

/// Build the result file for a power-law fit (x axis in pixels).
pub fn power_law_result(spectrum: &Spectrum, fit: &PowerLawFit) -> BackgroundFile {
    let signal = spectrum.intensity[fit.range.low..].to_vec();
    let subtracted = signal
        .iter()
        .zip(&fit.background)
        .map(|(s, b)| s - b)
        .collect();

    BackgroundFile {
        tool: TOOL_NAME.to_string(),
        generated: Utc::now(),
        source: spectrum.label(),
        model: BackgroundModel::PowerLaw {
            params: fit.params,
            range: fit.range,
        },
        degraded: fit.degraded,
        grid: BackgroundGrid {
            x_unit: AxisUnit::Pixel,
            x: fit.pixels.clone(),
            signal,
            background: fit.background.clone(),
            subtracted,
        },
    }
}

/// Build the result file for a Gaussian-Lorentz fit.
pub fn gauss_lorentz_result(spectrum: &Spectrum, fit: &GaussLorentzFit) -> BackgroundFile {
    let x_unit = if spectrum.has_energy_axis {
        AxisUnit::Ev
    } else {
        AxisUnit::Pixel
    };

    BackgroundFile {
        tool: TOOL_NAME.to_string(),
        generated: Utc::now(),
        source: spectrum.label(),
        model: BackgroundModel::GaussLorentz {
            params: fit.params,
            std_errors: fit.std_errors,
            pre: fit.pre,
            post: fit.post,
            solver: fit.report,
        },
        degraded: false,
        grid: BackgroundGrid {
            x_unit,
            x: fit.energy.clone(),
            signal: spectrum.intensity[fit.pre.low..fit.post.high].to_vec(),
            background: fit.background.clone(),
            subtracted: fit.subtracted.clone(),
        },
    }
}
