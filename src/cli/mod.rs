//! Command-line parsing for the EELS background fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{GlParams, PixelRange, SynthKind};
use crate::fit::DEFAULT_MAX_EVALUATIONS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "eelsbg", version, about = "EELS background fitting (power law and zero-loss peak)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a power-law background to core-loss spectra and extrapolate it past the window.
    PowerLaw(PowerLawArgs),
    /// Fit a Gaussian-Lorentz zero-loss peak to the pre/post windows of low-loss spectra.
    ZeroLoss(ZeroLossArgs),
    /// Write a synthetic spectrum CSV.
    Synth(SynthArgs),
    /// Plot a previously exported result JSON.
    Plot(PlotArgs),
}

/// Terminal output and export options shared by the fit commands.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write `<name>_bg.csv` and `<name>_bg.json` for each spectrum into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

/// Options for `power-law`.
#[derive(Debug, Args, Clone)]
pub struct PowerLawArgs {
    /// Spectrum CSV files.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// First pixel of the fitting window. Pixel 0 has no logarithm, so it must be >= 1.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub low: usize,

    /// One past the last pixel of the fitting window.
    #[arg(long)]
    pub high: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for `zero-loss`.
#[derive(Debug, Args, Clone)]
pub struct ZeroLossArgs {
    /// Spectrum CSV files.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Pre-edge fitting window, `LOW:HIGH` in pixels.
    #[arg(long, value_name = "LOW:HIGH")]
    pub pre: PixelRange,

    /// Post-edge fitting window, `LOW:HIGH` in pixels.
    #[arg(long, value_name = "LOW:HIGH")]
    pub post: PixelRange,

    /// Initial peak centre (eV).
    #[arg(long, default_value_t = GlParams::ZERO_LOSS.x0, allow_negative_numbers = true)]
    pub x0: f64,

    /// Initial Gaussian sigma (eV).
    #[arg(long, default_value_t = GlParams::ZERO_LOSS.sigma)]
    pub sigma: f64,

    /// Initial Lorentzian FWHM (eV).
    #[arg(long, default_value_t = GlParams::ZERO_LOSS.w)]
    pub fwhm: f64,

    /// Initial Gaussian fraction of the mixture.
    #[arg(long, default_value_t = GlParams::ZERO_LOSS.n)]
    pub mix: f64,

    /// Initial constant offset.
    #[arg(long, default_value_t = GlParams::ZERO_LOSS.c, allow_negative_numbers = true)]
    pub offset: f64,

    /// Cap on model evaluations before the fit is abandoned.
    #[arg(long, default_value_t = DEFAULT_MAX_EVALUATIONS)]
    pub max_evaluations: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for `synth`.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Spectrum type to generate.
    #[arg(long, value_enum, default_value_t = SynthKind::CoreLoss)]
    pub kind: SynthKind,

    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of channels.
    #[arg(long, default_value_t = 1024)]
    pub channels: usize,

    /// Energy of the first channel in eV [default: 250 core-loss, -5 low-loss].
    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<f64>,

    /// eV per channel [default: 0.5 core-loss, 0.02 low-loss].
    #[arg(long)]
    pub dispersion: Option<f64>,

    /// Relative Gaussian noise level.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved result.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Result JSON file produced with `--export-dir`.
    #[arg(long, value_name = "JSON")]
    pub result: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
