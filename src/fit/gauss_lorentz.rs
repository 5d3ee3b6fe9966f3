//! Gaussian-Lorentz background fit for low-loss spectra.
//!
//! The zero-loss peak is modelled as
//!
//! ```text
//! GL(x) = n * G(x, x0, sigma) + (1 - n) * L(x, x0, w) + C
//! ```
//!
//! and fitted jointly to a pre-edge and a post-edge window. The fitted model is
//! then evaluated over every channel from `pre.low` to `post.high` and subtracted
//! from the raw spectrum, which leaves the signal between the windows.

use log::{debug, error};

use crate::domain::{GaussLorentzFit, GlParams, PixelRange, SolverReport};
use crate::error::BackgroundError;
use crate::math::{LmOptions, levenberg_marquardt};
use crate::models::{gauss_lorentz_curve, gauss_lorentz_raw};

/// Default cap on model evaluations for the nonlinear solve.
pub const DEFAULT_MAX_EVALUATIONS: usize = 20_000;

/// Fit options for [`fit_gauss_lorentz_with`].
#[derive(Debug, Clone)]
pub struct GaussLorentzOptions {
    /// Starting point for the solver.
    pub initial: GlParams,
    pub max_evaluations: usize,
}

impl Default for GaussLorentzOptions {
    fn default() -> Self {
        Self {
            initial: GlParams::ZERO_LOSS,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

/// Fit the Gaussian-Lorentz model to the `pre` and `post` windows and subtract it.
pub fn fit_gauss_lorentz(
    energy: &[f64],
    spectrum: &[f64],
    pre: PixelRange,
    post: PixelRange,
    initial: GlParams,
) -> Result<GaussLorentzFit, BackgroundError> {
    let opts = GaussLorentzOptions {
        initial,
        ..GaussLorentzOptions::default()
    };
    fit_gauss_lorentz_with(energy, spectrum, pre, post, &opts)
}

/// [`fit_gauss_lorentz`] with an explicit evaluation cap.
pub fn fit_gauss_lorentz_with(
    energy: &[f64],
    spectrum: &[f64],
    pre: PixelRange,
    post: PixelRange,
    opts: &GaussLorentzOptions,
) -> Result<GaussLorentzFit, BackgroundError> {
    if energy.len() != spectrum.len() {
        return Err(BackgroundError::LengthMismatch {
            energy: energy.len(),
            spectrum: spectrum.len(),
        });
    }
    pre.validate(spectrum.len())?;
    post.validate(spectrum.len())?;
    // The output span runs from pre.low to post.high.
    if post.high <= pre.low {
        return Err(BackgroundError::InvalidRange {
            low: pre.low,
            high: post.high,
            len: spectrum.len(),
        });
    }

    // Pre-window values first, then post-window values.
    let fit_x: Vec<f64> = energy[pre.as_range()]
        .iter()
        .chain(&energy[post.as_range()])
        .copied()
        .collect();
    let fit_y: Vec<f64> = spectrum[pre.as_range()]
        .iter()
        .chain(&spectrum[post.as_range()])
        .copied()
        .collect();

    let lm_opts = LmOptions {
        max_evaluations: opts.max_evaluations,
        ..LmOptions::default()
    };
    let outcome = levenberg_marquardt(gauss_lorentz_raw, &fit_x, &fit_y, &opts.initial.to_array(), &lm_opts)
        .map_err(|e| {
            error!("Gaussian-Lorentz fit over pre {pre} / post {post} failed: {e}");
            e
        })?;

    let params = GlParams::from_slice(&outcome.params)
        .ok_or_else(|| BackgroundError::Fit("solver returned the wrong number of parameters".to_string()))?;
    let std_errors = outcome.std_errors().and_then(|e| GlParams::from_slice(&e));
    debug!(
        "Gaussian-Lorentz fit: {params:?} after {} iterations ({} evaluations), sse={:.6e}",
        outcome.iterations, outcome.evaluations, outcome.sse
    );

    let span = pre.low..post.high;
    let energy_out = energy[span.clone()].to_vec();
    let background = gauss_lorentz_curve(&energy_out, &params);
    let subtracted: Vec<f64> = spectrum[span]
        .iter()
        .zip(&background)
        .map(|(&s, &b)| s - b)
        .collect();

    let n = fit_x.len();
    Ok(GaussLorentzFit {
        params,
        std_errors,
        pre,
        post,
        energy: energy_out,
        background,
        subtracted,
        report: SolverReport {
            iterations: outcome.iterations,
            evaluations: outcome.evaluations,
            sse: outcome.sse,
            rmse: (outcome.sse / n as f64).sqrt(),
            n,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gauss_lorentz;

    fn energy_axis(len: usize, start: f64, step: f64) -> Vec<f64> {
        (0..len).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn recovers_synthetic_zero_loss_peak() {
        let truth = GlParams { x0: 0.0, sigma: 0.2, w: 0.2, n: 0.6, c: 1.0 };
        let energy = energy_axis(400, -2.0, 0.01);
        let spectrum: Vec<f64> = energy.iter().map(|&e| gauss_lorentz(e, &truth)).collect();

        let fit = fit_gauss_lorentz(
            &energy,
            &spectrum,
            PixelRange::new(0, 200),
            PixelRange::new(200, 400),
            GlParams::ZERO_LOSS,
        )
        .unwrap();

        let p = fit.params;
        assert!(p.x0.abs() < 1e-4, "{p:?}");
        assert!((p.sigma.abs() - 0.2).abs() < 1e-4, "{p:?}");
        assert!((p.w.abs() - 0.2).abs() < 1e-4, "{p:?}");
        assert!((p.n - 0.6).abs() < 1e-4, "{p:?}");
        assert!((p.c - 1.0).abs() < 1e-4, "{p:?}");
        assert_eq!(fit.subtracted.len(), 400);
        assert!(fit.subtracted.iter().all(|v| v.abs() < 1e-4));
        assert!(fit.report.sse < 1e-8);
    }

    #[test]
    fn flat_spectrum_subtracts_to_zero() {
        let energy = energy_axis(100, 10.0, 0.1);
        let spectrum = vec![2.0; 100];

        let fit = fit_gauss_lorentz(
            &energy,
            &spectrum,
            PixelRange::new(0, 10),
            PixelRange::new(90, 100),
            GlParams::ZERO_LOSS,
        )
        .unwrap();

        // Far from x0 the peak parameters trade off against C, so only the
        // fitted curve is pinned, not the individual parameters.
        assert!(fit.params.to_array().iter().all(|v| v.is_finite()), "{:?}", fit.params);
        assert!(fit.background.iter().all(|v| (v - 2.0).abs() < 1e-3));
        assert_eq!(fit.energy.len(), 100);
        assert_eq!(fit.subtracted.len(), 100);
        assert!(fit.subtracted.iter().all(|v| v.abs() < 1e-3), "{:?}", fit.subtracted);
    }

    #[test]
    fn edge_between_windows_survives_subtraction() {
        let truth = GlParams { x0: 0.0, sigma: 0.3, w: 0.4, n: 0.5, c: 0.2 };
        let energy = energy_axis(300, -1.0, 0.02);
        let spectrum: Vec<f64> = energy
            .iter()
            .enumerate()
            .map(|(i, &e)| gauss_lorentz(e, &truth) + if (150..200).contains(&i) { 0.5 } else { 0.0 })
            .collect();

        let fit = fit_gauss_lorentz(
            &energy,
            &spectrum,
            PixelRange::new(0, 120),
            PixelRange::new(220, 300),
            GlParams::ZERO_LOSS,
        )
        .unwrap();

        // Output starts at pre.low, so channel i maps to index i.
        assert!((fit.subtracted[170] - 0.5).abs() < 1e-3, "{}", fit.subtracted[170]);
        assert!(fit.subtracted[100].abs() < 1e-3);
        assert!(fit.subtracted[250].abs() < 1e-3);
    }

    #[test]
    fn output_lengths_follow_exact_pixel_span() {
        let energy = energy_axis(500, -5.0, 0.05);
        let truth = GlParams { x0: 0.1, sigma: 0.5, w: 0.6, n: 0.3, c: 0.05 };
        let spectrum: Vec<f64> = energy.iter().map(|&e| gauss_lorentz(e, &truth)).collect();

        for &(pre, post) in &[((0, 10), (90, 100)), ((13, 57), (211, 499)), ((40, 100), (100, 500))] {
            let pre = PixelRange::new(pre.0, pre.1);
            let post = PixelRange::new(post.0, post.1);
            let fit = fit_gauss_lorentz(&energy, &spectrum, pre, post, truth).unwrap();
            let expected = post.high - pre.low;
            assert_eq!(fit.energy.len(), expected);
            assert_eq!(fit.background.len(), expected);
            assert_eq!(fit.subtracted.len(), expected);
            assert_eq!(fit.energy[0], energy[pre.low]);
            assert_eq!(*fit.energy.last().unwrap(), energy[post.high - 1]);
        }
    }

    #[test]
    fn solver_failure_propagates() {
        let energy = energy_axis(50, 0.0, 0.1);
        let mut spectrum = vec![1.0; 50];
        spectrum[3] = f64::NAN;

        let err = fit_gauss_lorentz(
            &energy,
            &spectrum,
            PixelRange::new(0, 10),
            PixelRange::new(40, 50),
            GlParams::ZERO_LOSS,
        )
        .unwrap_err();
        assert!(matches!(err, BackgroundError::Fit(_)), "{err}");
    }

    #[test]
    fn evaluation_cap_propagates() {
        let energy = energy_axis(200, -2.0, 0.02);
        let truth = GlParams { x0: 0.3, sigma: 0.25, w: 0.5, n: 0.7, c: 0.4 };
        let spectrum: Vec<f64> = energy.iter().map(|&e| gauss_lorentz(e, &truth)).collect();
        let opts = GaussLorentzOptions {
            initial: GlParams::ZERO_LOSS,
            max_evaluations: 8,
        };

        let err = fit_gauss_lorentz_with(&energy, &spectrum, PixelRange::new(0, 100), PixelRange::new(100, 200), &opts)
            .unwrap_err();
        assert!(matches!(err, BackgroundError::Fit(_)), "{err}");
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let energy = energy_axis(10, 0.0, 1.0);
        let spectrum = vec![1.0; 9];
        let err = fit_gauss_lorentz(&energy, &spectrum, PixelRange::new(0, 2), PixelRange::new(5, 9), GlParams::ZERO_LOSS)
            .unwrap_err();
        assert_eq!(err, BackgroundError::LengthMismatch { energy: 10, spectrum: 9 });

        let spectrum = vec![1.0; 10];
        let err = fit_gauss_lorentz(&energy, &spectrum, PixelRange::new(0, 2), PixelRange::new(5, 11), GlParams::ZERO_LOSS)
            .unwrap_err();
        assert!(matches!(err, BackgroundError::InvalidRange { .. }));
    }
}
