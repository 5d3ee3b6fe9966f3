//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - runs the background fits (in parallel for several files)
//! - prints reports/plots
//! - writes optional exports

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info};

use crate::cli::{Command, OutputArgs, PlotArgs, PowerLawArgs, SynthArgs, ZeroLossArgs};
use crate::domain::{
    GlParams, OutputConfig, PixelRange, PowerLawConfig, SynthConfig, SynthKind, ZeroLossConfig,
};
use crate::error::AppError;

pub mod pipeline;

use pipeline::RunOutput;

/// Entry point for the `eelsbg` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::PowerLaw(args) => handle_power_law(args),
        Command::ZeroLoss(args) => handle_zero_loss(args),
        Command::Synth(args) => handle_synth(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn handle_power_law(args: PowerLawArgs) -> Result<(), AppError> {
    let config = power_law_config_from_args(&args);
    let results = pipeline::run_batch(&config.inputs, |path| pipeline::run_power_law(path, config.range));
    report_batch(results, &config.output)
}

fn handle_zero_loss(args: ZeroLossArgs) -> Result<(), AppError> {
    let config = zero_loss_config_from_args(&args);
    let results = pipeline::run_batch(&config.inputs, |path| pipeline::run_zero_loss(path, &config));
    report_batch(results, &config.output)
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let spectrum = crate::data::generate_spectrum(&config)?;
    crate::io::write_spectrum_csv(&config.out, &spectrum.energy, &spectrum.intensity)?;
    println!(
        "Wrote {} channels ({:?}, seed={}) to {}",
        spectrum.energy.len(),
        config.kind,
        config.seed,
        config.out.display()
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let result = crate::io::read_result_json(&args.result)?;
    println!("{}", crate::report::format_run_summary(&result));
    println!("{}", crate::plot::render_ascii_plot(&result, args.width, args.height));
    Ok(())
}

/// Print and export every successful run in input order.
///
/// Failures are reported as they are reached; the first one decides the exit code.
fn report_batch(results: Vec<Result<RunOutput, AppError>>, output: &OutputConfig) -> Result<(), AppError> {
    let total = results.len();
    let mut first_failure: Option<AppError> = None;
    let mut failed = 0;

    for result in results {
        let outcome = result.and_then(|run| present_run(&run, output));
        if let Err(err) = outcome {
            failed += 1;
            if total > 1 {
                error!("{err}");
            }
            first_failure.get_or_insert(err);
        }
    }

    match first_failure {
        None => Ok(()),
        Some(err) if total == 1 => Err(err),
        Some(err) => Err(AppError::new(
            err.exit_code(),
            format!("{failed} of {total} spectra failed; first failure: {err}"),
        )),
    }
}

fn present_run(run: &RunOutput, output: &OutputConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_run_summary(&run.result));
    if output.plot {
        let plot = crate::plot::render_ascii_plot(&run.result, output.plot_width, output.plot_height);
        println!("{plot}");
    }

    if let Some(dir) = &output.export_dir {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;
        let (csv_path, json_path) = export_paths(dir, &run.spectrum.source);
        crate::io::write_background_csv(&csv_path, &run.result.grid)?;
        crate::io::write_result_json(&json_path, &run.result)?;
        info!("exported {} and {}", csv_path.display(), json_path.display());
    }
    Ok(())
}

/// `<dir>/<stem>_bg.csv` and `<dir>/<stem>_bg.json` for a source spectrum.
fn export_paths(dir: &Path, source: &Path) -> (PathBuf, PathBuf) {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spectrum".to_string());
    (
        dir.join(format!("{stem}_bg.csv")),
        dir.join(format!("{stem}_bg.json")),
    )
}

pub fn output_config_from_args(args: &OutputArgs) -> OutputConfig {
    OutputConfig {
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_dir: args.export_dir.clone(),
    }
}

pub fn power_law_config_from_args(args: &PowerLawArgs) -> PowerLawConfig {
    PowerLawConfig {
        inputs: args.files.clone(),
        range: PixelRange::new(args.low, args.high),
        output: output_config_from_args(&args.output),
    }
}

pub fn zero_loss_config_from_args(args: &ZeroLossArgs) -> ZeroLossConfig {
    ZeroLossConfig {
        inputs: args.files.clone(),
        pre: args.pre,
        post: args.post,
        initial: GlParams {
            x0: args.x0,
            sigma: args.sigma,
            w: args.fwhm,
            n: args.mix,
            c: args.offset,
        },
        max_evaluations: args.max_evaluations,
        output: output_config_from_args(&args.output),
    }
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    let (default_offset, default_dispersion) = match args.kind {
        SynthKind::CoreLoss => (250.0, 0.5),
        SynthKind::LowLoss => (-5.0, 0.02),
    };
    SynthConfig {
        kind: args.kind,
        out: args.out.clone(),
        channels: args.channels,
        offset: args.offset.unwrap_or(default_offset),
        dispersion: args.dispersion.unwrap_or(default_dispersion),
        noise: args.noise,
        seed: args.seed,
    }
}
