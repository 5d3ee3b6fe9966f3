//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimises `Σ (y_i - f(x_i; p))^2` for a scalar model `f`.
//!
//! Each iteration:
//! - builds a forward-difference Jacobian `J` of the model at `p`
//! - solves `(JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr` by Cholesky
//! - accepts `p + δ` if the cost drops (λ shrinks), otherwise grows λ and retries
//!
//! Termination:
//! - `ftol`: relative cost reduction of an accepted step
//! - `xtol`: step length relative to `|p|`
//! - exact zero cost or zero gradient
//!
//! Running out of model evaluations is an error, as is a non-finite cost at the
//! starting point.

use nalgebra::{DMatrix, DVector};

use crate::error::BackgroundError;

const SQRT_EPS: f64 = 1.490_116_119_384_765_6e-8;

/// Floor for the damping diagonal so zero-sensitivity parameters stay pinned.
const DIAG_FLOOR: f64 = 1e-12;

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e32;

/// Solver settings.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Cap on model evaluations (one evaluation = the model over all points).
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub initial_damping: f64,
    pub damping_up: f64,
    pub damping_down: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 20_000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            initial_damping: 1e-3,
            damping_up: 10.0,
            damping_down: 0.1,
        }
    }
}

/// Converged solution.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    pub iterations: usize,
    pub evaluations: usize,
    /// `pinv(JᵀJ) * sse / (m - n)`; `None` when `m <= n` or the Jacobian is not finite.
    pub covariance: Option<DMatrix<f64>>,
}

impl LmOutcome {
    /// Square roots of the covariance diagonal.
    pub fn std_errors(&self) -> Option<Vec<f64>> {
        let cov = self.covariance.as_ref()?;
        let out: Vec<f64> = (0..cov.nrows()).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();
        out.iter().all(|v| v.is_finite()).then_some(out)
    }
}

/// Fit `model(x, params)` to `(x, y)` starting from `initial`.
pub fn levenberg_marquardt<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    opts: &LmOptions,
) -> Result<LmOutcome, BackgroundError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = x.len();
    let n = initial.len();
    if y.len() != m {
        return Err(BackgroundError::Fit(format!("x has {m} values but y has {}", y.len())));
    }
    if n == 0 {
        return Err(BackgroundError::Fit("no parameters to fit".to_string()));
    }
    if m < n {
        return Err(BackgroundError::Fit(format!(
            "{m} data points cannot determine {n} parameters"
        )));
    }

    let mut params = DVector::from_column_slice(initial);
    let mut residuals = residual_vector(&model, x, y, params.as_slice());
    let mut evaluations = 1usize;
    let mut cost = residuals.norm_squared();
    if !cost.is_finite() {
        return Err(BackgroundError::Fit(
            "non-finite residuals at the initial parameters".to_string(),
        ));
    }

    let mut damping = opts.initial_damping;
    let mut iterations = 0usize;

    'outer: loop {
        if cost == 0.0 {
            break;
        }
        if evaluations + n + 1 > opts.max_evaluations {
            return Err(not_converged(opts.max_evaluations));
        }
        iterations += 1;

        let jac = jacobian(&model, x, y, &residuals, params.as_slice())?;
        evaluations += n;

        let jt = jac.transpose();
        let jtj = &jt * &jac;
        let grad = &jt * &residuals;
        if grad.amax() == 0.0 {
            break;
        }

        loop {
            if evaluations >= opts.max_evaluations {
                return Err(not_converged(opts.max_evaluations));
            }

            let mut damped = jtj.clone();
            for i in 0..n {
                damped[(i, i)] += damping * jtj[(i, i)].max(DIAG_FLOOR);
            }

            let Some(chol) = damped.cholesky() else {
                damping *= opts.damping_up;
                if damping > MAX_DAMPING {
                    return Err(BackgroundError::Fit("normal equations are singular".to_string()));
                }
                continue;
            };
            let step = chol.solve(&grad);
            let step_small = step.norm() <= opts.xtol * (params.norm() + opts.xtol);

            let trial = &params + &step;
            let trial_residuals = residual_vector(&model, x, y, trial.as_slice());
            evaluations += 1;
            let trial_cost = trial_residuals.norm_squared();

            if trial_cost.is_finite() && trial_cost < cost {
                let reduction = (cost - trial_cost) / cost;
                params = trial;
                residuals = trial_residuals;
                cost = trial_cost;
                damping = (damping * opts.damping_down).max(MIN_DAMPING);

                if reduction <= opts.ftol || step_small {
                    break 'outer;
                }
                continue 'outer;
            }

            if step_small {
                break 'outer;
            }
            damping *= opts.damping_up;
            if damping > MAX_DAMPING {
                return Err(BackgroundError::Fit(
                    "damping diverged without reducing the residuals".to_string(),
                ));
            }
        }
    }

    let covariance = covariance(&model, x, y, &residuals, params.as_slice(), cost);
    if covariance.is_some() {
        evaluations += n;
    }

    Ok(LmOutcome {
        params: params.iter().copied().collect(),
        sse: cost,
        iterations,
        evaluations,
        covariance,
    })
}

fn not_converged(cap: usize) -> BackgroundError {
    BackgroundError::Fit(format!("did not converge within {cap} model evaluations"))
}

fn residual_vector<F>(model: &F, x: &[f64], y: &[f64], p: &[f64]) -> DVector<f64>
where
    F: Fn(f64, &[f64]) -> f64,
{
    DVector::from_iterator(x.len(), x.iter().zip(y).map(|(&xi, &yi)| yi - model(xi, p)))
}

/// Forward-difference Jacobian of the model (not the residuals).
fn jacobian<F>(
    model: &F,
    x: &[f64],
    y: &[f64],
    residuals: &DVector<f64>,
    p: &[f64],
) -> Result<DMatrix<f64>, BackgroundError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = x.len();
    let n = p.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut shifted = p.to_vec();

    for j in 0..n {
        let h = if p[j] == 0.0 { SQRT_EPS } else { SQRT_EPS * p[j].abs() };
        shifted[j] = p[j] + h;
        for i in 0..m {
            let base = y[i] - residuals[i];
            let d = (model(x[i], &shifted) - base) / h;
            if !d.is_finite() {
                return Err(BackgroundError::Fit(format!(
                    "non-finite derivative for parameter {j} at x={}",
                    x[i]
                )));
            }
            jac[(i, j)] = d;
        }
        shifted[j] = p[j];
    }

    Ok(jac)
}

fn covariance<F>(
    model: &F,
    x: &[f64],
    y: &[f64],
    residuals: &DVector<f64>,
    p: &[f64],
    sse: f64,
) -> Option<DMatrix<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = x.len();
    let n = p.len();
    if m <= n {
        return None;
    }
    let jac = jacobian(model, x, y, residuals, p).ok()?;
    let jtj = jac.transpose() * &jac;
    let inv = jtj.pseudo_inverse(1e-15).ok()?;
    let cov = inv * (sse / (m - n) as f64);
    cov.iter().all(|v| v.is_finite()).then_some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_decay(x: f64, p: &[f64]) -> f64 {
        p[0] * (-p[1] * x).exp() + p[2]
    }

    #[test]
    fn recovers_exponential_decay() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&v| exp_decay(v, &[3.0, 1.2, 0.5])).collect();

        let out = levenberg_marquardt(exp_decay, &x, &y, &[1.0, 0.5, 0.0], &LmOptions::default()).unwrap();
        assert!((out.params[0] - 3.0).abs() < 1e-6, "{:?}", out.params);
        assert!((out.params[1] - 1.2).abs() < 1e-6, "{:?}", out.params);
        assert!((out.params[2] - 0.5).abs() < 1e-6, "{:?}", out.params);
        assert!(out.sse < 1e-12);
        assert!(out.iterations > 0);
    }

    #[test]
    fn linear_model_reports_covariance() {
        // y = 2x + 1 with alternating ±0.1 noise.
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 2.0 * v + 1.0 + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let line = |x: f64, p: &[f64]| p[0] * x + p[1];

        let out = levenberg_marquardt(line, &x, &y, &[0.0, 0.0], &LmOptions::default()).unwrap();
        assert!((out.params[0] - 2.0).abs() < 1e-2);
        let errs = out.std_errors().unwrap();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|&e| e > 0.0 && e < 0.1), "{errs:?}");
    }

    #[test]
    fn evaluation_cap_is_an_error() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&v| exp_decay(v, &[3.0, 1.2, 0.5])).collect();
        let opts = LmOptions {
            max_evaluations: 6,
            ..LmOptions::default()
        };

        let err = levenberg_marquardt(exp_decay, &x, &y, &[1.0, 0.5, 0.0], &opts).unwrap_err();
        assert!(matches!(err, BackgroundError::Fit(ref m) if m.contains("did not converge")), "{err}");
    }

    #[test]
    fn non_finite_data_is_an_error() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, f64::NAN, 2.0, 3.0];
        let line = |x: f64, p: &[f64]| p[0] * x + p[1];
        assert!(levenberg_marquardt(line, &x, &y, &[0.0, 0.0], &LmOptions::default()).is_err());
    }

    #[test]
    fn underdetermined_problem_is_an_error() {
        let line = |x: f64, p: &[f64]| p[0] * x + p[1];
        assert!(levenberg_marquardt(line, &[1.0], &[2.0], &[0.0, 0.0], &LmOptions::default()).is_err());
    }
}
