//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed between the fitters and the front-end
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BackgroundError;

/// Half-open pixel interval `[low, high)` selecting a fitting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRange {
    pub low: usize,
    pub high: usize,
}

impl PixelRange {
    pub const fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Number of pixels in the window.
    pub fn len(self) -> usize {
        self.high.saturating_sub(self.low)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn as_range(self) -> Range<usize> {
        self.low..self.high
    }

    /// Check `low < high <= len`.
    pub fn validate(self, len: usize) -> Result<(), BackgroundError> {
        if self.low < self.high && self.high <= len {
            Ok(())
        } else {
            Err(BackgroundError::InvalidRange {
                low: self.low,
                high: self.high,
                len,
            })
        }
    }
}

impl fmt::Display for PixelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

/// Parses `LOW:HIGH` (as used on the command line).
impl FromStr for PixelRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LOW:HIGH, got '{s}'"))?;
        let low = low
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid range start '{low}': {e}"))?;
        let high = high
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid range end '{high}': {e}"))?;
        if low >= high {
            return Err(format!("range start must be below range end, got {low}:{high}"));
        }
        Ok(Self { low, high })
    }
}

/// Power law `I(x) = A * x^r`, stored as `(r, ln A)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLawParams {
    pub exponent: f64,
    pub log_intercept: f64,
}

impl PowerLawParams {
    /// Linear-space amplitude `A`.
    pub fn amplitude(self) -> f64 {
        self.log_intercept.exp()
    }
}

/// Parameters of the mixed Gaussian/Lorentzian model
///
/// `GL(x) = n * G(x, x0, sigma) + (1 - n) * L(x, x0, w) + C`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlParams {
    /// Peak centre (eV).
    pub x0: f64,
    /// Gaussian standard deviation (eV).
    pub sigma: f64,
    /// Lorentzian full width at half maximum (eV).
    pub w: f64,
    /// Gaussian fraction of the mixture, nominally in `[0, 1]`.
    pub n: f64,
    /// Constant offset (signal units).
    pub c: f64,
}

impl GlParams {
    pub const LEN: usize = 5;

    /// Zero-loss peak at 0 eV, 0.15 eV widths, equal mixing, no offset.
    pub const ZERO_LOSS: GlParams = GlParams {
        x0: 0.0,
        sigma: 0.15,
        w: 0.15,
        n: 0.5,
        c: 0.0,
    };

    pub fn to_array(self) -> [f64; Self::LEN] {
        [self.x0, self.sigma, self.w, self.n, self.c]
    }

    /// Build from a parameter slice in `(x0, sigma, w, n, C)` order.
    pub fn from_slice(p: &[f64]) -> Option<Self> {
        match p {
            &[x0, sigma, w, n, c] => Some(Self { x0, sigma, w, n, c }),
            _ => None,
        }
    }
}

impl Default for GlParams {
    fn default() -> Self {
        Self::ZERO_LOSS
    }
}

/// Output of the power-law background fit.
#[derive(Debug, Clone)]
pub struct PowerLawFit {
    pub params: PowerLawParams,
    pub range: PixelRange,
    /// Pixel positions `range.low .. len`.
    pub pixels: Vec<f64>,
    /// Background at each entry of `pixels`.
    pub background: Vec<f64>,
    /// True when evaluation failed and `background` was zero-filled.
    pub degraded: bool,
}

/// Nonlinear solver diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    pub iterations: usize,
    pub evaluations: usize,
    pub sse: f64,
    pub rmse: f64,
    /// Number of fitted points.
    pub n: usize,
}

/// Output of the Gaussian-Lorentz background fit.
#[derive(Debug, Clone)]
pub struct GaussLorentzFit {
    pub params: GlParams,
    /// One-sigma parameter uncertainties, when the covariance is defined.
    pub std_errors: Option<GlParams>,
    pub pre: PixelRange,
    pub post: PixelRange,
    /// Energy values `energy[pre.low .. post.high]`.
    pub energy: Vec<f64>,
    pub background: Vec<f64>,
    /// Raw spectrum minus background over the same span.
    pub subtracted: Vec<f64>,
    pub report: SolverReport,
}

/// A spectrum loaded by the front-end.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub source: PathBuf,
    /// Energy-loss axis (eV); pixel indices when the file has no energy column.
    pub energy: Vec<f64>,
    pub intensity: Vec<f64>,
    pub has_energy_axis: bool,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// File name used in reports.
    pub fn label(&self) -> String {
        self.source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Which synthetic spectrum to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SynthKind {
    /// Power-law background with an ionisation edge.
    CoreLoss,
    /// Zero-loss peak with a plasmon bump.
    LowLoss,
}

/// Terminal/export settings shared by the fit commands.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_dir: Option<PathBuf>,
}

/// A power-law run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct PowerLawConfig {
    pub inputs: Vec<PathBuf>,
    pub range: PixelRange,
    pub output: OutputConfig,
}

/// A zero-loss (Gaussian-Lorentz) run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct ZeroLossConfig {
    pub inputs: Vec<PathBuf>,
    pub pre: PixelRange,
    pub post: PixelRange,
    pub initial: GlParams,
    pub max_evaluations: usize,
    pub output: OutputConfig,
}

/// Synthetic spectrum generation settings.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub kind: SynthKind,
    pub out: PathBuf,
    pub channels: usize,
    /// Energy of channel 0 (eV).
    pub offset: f64,
    /// eV per channel.
    pub dispersion: f64,
    /// Standard deviation of additive Gaussian noise.
    pub noise: f64,
    pub seed: u64,
}

/// Unit of the x-axis stored in a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisUnit {
    Pixel,
    Ev,
}

/// Fitted model recorded in a result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundModel {
    PowerLaw {
        params: PowerLawParams,
        range: PixelRange,
    },
    GaussLorentz {
        params: GlParams,
        std_errors: Option<GlParams>,
        pre: PixelRange,
        post: PixelRange,
        solver: SolverReport,
    },
}

impl BackgroundModel {
    pub fn display_name(&self) -> &'static str {
        match self {
            BackgroundModel::PowerLaw { .. } => "power law",
            BackgroundModel::GaussLorentz { .. } => "Gaussian-Lorentz",
        }
    }
}

/// Evaluated grid stored alongside the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundGrid {
    pub x_unit: AxisUnit,
    pub x: Vec<f64>,
    pub signal: Vec<f64>,
    pub background: Vec<f64>,
    pub subtracted: Vec<f64>,
}

/// A saved result file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub source: String,
    pub model: BackgroundModel,
    pub degraded: bool,
    pub grid: BackgroundGrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_range_parses_and_validates() {
        let r: PixelRange = "10:60".parse().unwrap();
        assert_eq!(r, PixelRange::new(10, 60));
        assert_eq!(r.len(), 50);
        assert!(r.validate(60).is_ok());
        assert!(r.validate(59).is_err());

        assert!("60:10".parse::<PixelRange>().is_err());
        assert!("10".parse::<PixelRange>().is_err());
        assert!("a:3".parse::<PixelRange>().is_err());
    }

    #[test]
    fn empty_range_is_rejected() {
        let err = PixelRange::new(4, 4).validate(10).unwrap_err();
        assert_eq!(err, BackgroundError::InvalidRange { low: 4, high: 4, len: 10 });
    }

    #[test]
    fn gl_params_slice_round_trip_order() {
        let p = GlParams { x0: 1.0, sigma: 2.0, w: 3.0, n: 0.4, c: 5.0 };
        assert_eq!(p.to_array(), [1.0, 2.0, 3.0, 0.4, 5.0]);
        assert_eq!(GlParams::from_slice(&p.to_array()), Some(p));
        assert_eq!(GlParams::from_slice(&[1.0, 2.0]), None);
        assert_eq!(GlParams::default(), GlParams::ZERO_LOSS);
    }
}
