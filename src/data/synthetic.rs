//! Synthetic EELS spectra for demos and tests.
//!
//! - core-loss: power-law background `B * (E/E0)^-3` with a smoothed ionisation edge
//! - low-loss: Gaussian-Lorentz zero-loss peak on a small offset, plus a plasmon bump
//!
//! Noise is Gaussian with a standard deviation proportional to the clean signal.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{GlParams, SynthConfig, SynthKind};
use crate::error::AppError;
use crate::math::gauss1d;
use crate::models::gauss_lorentz;

/// Counts at the first channel of a core-loss spectrum.
const CORE_LOSS_SCALE: f64 = 1e5;
const CORE_LOSS_EXPONENT: f64 = -3.0;
/// Edge onset as a fraction of the energy span.
const EDGE_POSITION: f64 = 0.6;
/// Edge jump relative to the background at the onset.
const EDGE_JUMP: f64 = 0.4;
/// Edge rise width (eV).
const EDGE_WIDTH: f64 = 1.0;

/// Zero-loss peak used for low-loss spectra.
pub const LOW_LOSS_ZLP: GlParams = GlParams {
    x0: 0.0,
    sigma: 0.2,
    w: 0.25,
    n: 0.6,
    c: 0.01,
};
const PLASMON_ENERGY: f64 = 15.0;
const PLASMON_WIDTH: f64 = 3.0;
const PLASMON_HEIGHT: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SyntheticSpectrum {
    pub energy: Vec<f64>,
    /// Noisy intensities.
    pub intensity: Vec<f64>,
    /// Intensities before noise.
    pub clean: Vec<f64>,
}

pub fn generate_spectrum(config: &SynthConfig) -> Result<SyntheticSpectrum, AppError> {
    if config.channels < 2 {
        return Err(AppError::new(2, "Channel count must be >= 2."));
    }
    if !(config.dispersion.is_finite() && config.dispersion > 0.0) {
        return Err(AppError::new(2, "Dispersion must be finite and > 0."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be finite and >= 0."));
    }
    if !config.offset.is_finite() {
        return Err(AppError::new(2, "Energy offset must be finite."));
    }
    if config.kind == SynthKind::CoreLoss && config.offset <= 0.0 {
        return Err(AppError::new(2, "Core-loss spectra need a positive energy offset."));
    }

    let energy: Vec<f64> = (0..config.channels)
        .map(|i| config.offset + config.dispersion * i as f64)
        .collect();

    let clean: Vec<f64> = match config.kind {
        SynthKind::CoreLoss => {
            let e_end = config.offset + config.dispersion * (config.channels - 1) as f64;
            let onset = config.offset + EDGE_POSITION * (e_end - config.offset);
            energy.iter().map(|&e| core_loss(e, config.offset, onset)).collect()
        }
        SynthKind::LowLoss => energy.iter().map(|&e| low_loss(e)).collect(),
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let intensity = clean
        .iter()
        .map(|&v| v + config.noise * v.abs() * normal.sample(&mut rng))
        .collect();

    Ok(SyntheticSpectrum {
        energy,
        intensity,
        clean,
    })
}

fn core_loss(e: f64, e0: f64, onset: f64) -> f64 {
    let background = CORE_LOSS_SCALE * (e / e0).powf(CORE_LOSS_EXPONENT);
    let at_onset = CORE_LOSS_SCALE * (onset / e0).powf(CORE_LOSS_EXPONENT);
    // Smoothed step, then a slower decay than the background.
    let step = 0.5 + ((e - onset) / EDGE_WIDTH).atan() / std::f64::consts::PI;
    let edge = EDGE_JUMP * at_onset * step * (onset / e).powf(1.5);
    background + edge
}

fn low_loss(e: f64) -> f64 {
    gauss_lorentz(e, &LOW_LOSS_ZLP) + PLASMON_HEIGHT * gauss1d(e, PLASMON_ENERGY, PLASMON_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixelRange;
    use crate::fit::{fit_gauss_lorentz, fit_power_law};

    fn config(kind: SynthKind) -> SynthConfig {
        let (offset, dispersion) = match kind {
            SynthKind::CoreLoss => (250.0, 0.5),
            SynthKind::LowLoss => (-3.0, 0.02),
        };
        SynthConfig {
            kind,
            out: "unused.csv".into(),
            channels: 400,
            offset,
            dispersion,
            noise: 0.01,
            seed: 7,
        }
    }

    #[test]
    fn same_seed_same_spectrum() {
        let a = generate_spectrum(&config(SynthKind::CoreLoss)).unwrap();
        let b = generate_spectrum(&config(SynthKind::CoreLoss)).unwrap();
        assert_eq!(a.intensity, b.intensity);

        let mut other = config(SynthKind::CoreLoss);
        other.seed = 8;
        let c = generate_spectrum(&other).unwrap();
        assert_ne!(a.intensity, c.intensity);
    }

    #[test]
    fn zero_noise_is_clean() {
        let mut cfg = config(SynthKind::LowLoss);
        cfg.noise = 0.0;
        let s = generate_spectrum(&cfg).unwrap();
        assert_eq!(s.intensity, s.clean);
        assert_eq!(s.energy.len(), 400);
    }

    #[test]
    fn noisy_core_loss_pre_edge_is_power_law_like() {
        let s = generate_spectrum(&config(SynthKind::CoreLoss)).unwrap();
        // Pre-edge window ending ~20 channels before the onset at channel 239.
        let fit = fit_power_law(&s.intensity, PixelRange::new(150, 220)).unwrap();
        assert!(!fit.degraded);
        assert!(fit.params.exponent < 0.0, "r={}", fit.params.exponent);

        // Subtracting the extrapolated background exposes the edge (~25% of the signal).
        let idx = 260;
        let edge = s.intensity[idx] - fit.background[idx - 150];
        assert!(edge > 0.1 * s.intensity[idx], "edge signal {edge}");
    }

    #[test]
    fn noisy_low_loss_zero_loss_peak_is_recovered() {
        let mut cfg = config(SynthKind::LowLoss);
        cfg.noise = 0.002;
        let s = generate_spectrum(&cfg).unwrap();
        // -3 eV .. 2 eV around the peak, 0.02 eV per channel.
        let fit = fit_gauss_lorentz(
            &s.energy,
            &s.intensity,
            PixelRange::new(0, 150),
            PixelRange::new(150, 250),
            GlParams::ZERO_LOSS,
        )
        .unwrap();

        assert!(fit.params.x0.abs() < 0.01, "{:?}", fit.params);
        assert!((fit.params.n - LOW_LOSS_ZLP.n).abs() < 0.1, "{:?}", fit.params);
        assert!(fit.std_errors.is_some());
    }

    #[test]
    fn core_loss_needs_positive_offset() {
        let mut cfg = config(SynthKind::CoreLoss);
        cfg.offset = 0.0;
        assert_eq!(generate_spectrum(&cfg).unwrap_err().exit_code(), 2);
    }
}
