//! Power-law background fit for core-loss spectra.
//!
//! Given:
//! - a signal indexed by pixel
//! - a fitting window `[low, high)`
//!
//! we fit `I(x) = A * x^r` in log-log space over the window (x = pixel index) and
//! evaluate it from `low` to the end of the spectrum.
//!
//! The signal is floored at zero and shifted by one before taking logs, so empty
//! or negative channels stay in the fit. This biases the fit for low-count data
//! but keeps every window usable.

use log::{debug, error, warn};

use crate::domain::{PixelRange, PowerLawFit};
use crate::error::BackgroundError;
use crate::math::fit_log_log;
use crate::models::power_law_background;

/// Fit a power-law background to `signal[range]`.
///
/// Fit failures are returned. If the fitted law cannot be evaluated over the output
/// pixels, the background is zero-filled and `degraded` is set.
pub fn fit_power_law(signal: &[f64], range: PixelRange) -> Result<PowerLawFit, BackgroundError> {
    range.validate(signal.len())?;

    let fit_x: Vec<f64> = range.as_range().map(|i| i as f64).collect();
    let fit_y: Vec<f64> = signal[range.as_range()]
        .iter()
        .map(|&v| if v < 0.0 { 1.0 } else { v + 1.0 })
        .collect();

    let params = fit_log_log(&fit_x, &fit_y).map_err(|e| {
        error!("power-law fit over pixels {range} failed: {e}");
        e
    })?;
    debug!(
        "power-law fit over pixels {range}: r={:.6}, ln A={:.6}",
        params.exponent, params.log_intercept
    );

    let pixels: Vec<f64> = (range.low..signal.len()).map(|i| i as f64).collect();
    let (background, degraded) = match power_law_background(&pixels, params) {
        Ok(bg) => (bg, false),
        Err(e) => {
            warn!("{e}; using a zero background");
            (vec![0.0; pixels.len()], true)
        }
    };

    Ok(PowerLawFit {
        params,
        range,
        pixels,
        background,
        degraded,
    })
}
