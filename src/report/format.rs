//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (easy to snapshot)
//!
//! Everything is rendered from a `BackgroundFile`, so a fresh fit and a reloaded
//! result print the same way.

use crate::domain::{AxisUnit, BackgroundFile, BackgroundModel, GlParams};

/// Format the full run summary (source, model parameters, diagnostics).
pub fn format_run_summary(result: &BackgroundFile) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== {} - {} background ===\n",
        result.tool,
        result.model.display_name()
    ));
    out.push_str(&format!("Source: {}\n", result.source));

    match &result.model {
        BackgroundModel::PowerLaw { params, range } => {
            out.push_str(&format!("Window: pixels {range} (n={})\n", range.len()));
            out.push_str("\nModel: I(x) = A * x^r\n");
            out.push_str(&format!("- r    : {:.6}\n", params.exponent));
            out.push_str(&format!("- ln A : {:.6}\n", params.log_intercept));
            out.push_str(&format!("- A    : {:.6e}\n", params.amplitude()));
        }
        BackgroundModel::GaussLorentz {
            params,
            std_errors,
            pre,
            post,
            solver,
        } => {
            out.push_str(&format!(
                "Windows: pre={pre} post={post} (n={})\n",
                solver.n
            ));
            out.push_str(&format!(
                "Solver: iterations={} evaluations={} SSE={:.6e} RMSE={:.6e}\n",
                solver.iterations, solver.evaluations, solver.sse, solver.rmse
            ));
            out.push_str("\nModel: GL(x) = n*G(x; x0, sigma) + (1-n)*L(x; x0, w) + C\n");
            out.push_str(&format_gl_params(params, std_errors.as_ref()));
        }
    }

    out.push_str(&format!("\nOutput: {}\n", format_grid_span(result)));
    if result.degraded {
        out.push_str("WARNING: background could not be evaluated; a zero background was written.\n");
    }

    out
}

fn format_gl_params(params: &GlParams, std_errors: Option<&GlParams>) -> String {
    const NAMES: [&str; GlParams::LEN] = ["x0", "sigma", "w", "n", "C"];

    let values = params.to_array();
    let errors = std_errors.map(|e| e.to_array());

    let mut out = String::new();
    for (i, name) in NAMES.iter().enumerate() {
        match errors {
            Some(err) => out.push_str(&format!("- {name:<5} : {:>14.6e} +/- {:.2e}\n", values[i], err[i])),
            None => out.push_str(&format!("- {name:<5} : {:>14.6e}\n", values[i])),
        }
    }
    if errors.is_none() {
        out.push_str("  (uncertainties unavailable)\n");
    }
    out
}

fn format_grid_span(result: &BackgroundFile) -> String {
    let grid = &result.grid;
    let (Some(first), Some(last)) = (grid.x.first(), grid.x.last()) else {
        return "empty grid".to_string();
    };
    match grid.x_unit {
        AxisUnit::Pixel => format!("{} channels, pixels [{first}, {last}]", grid.x.len()),
        AxisUnit::Ev => format!("{} channels, energy [{first:.3}, {last:.3}] eV", grid.x.len()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{BackgroundGrid, PixelRange, PowerLawParams, SolverReport};

    fn grid(x_unit: AxisUnit, x: Vec<f64>) -> BackgroundGrid {
        let n = x.len();
        BackgroundGrid {
            x_unit,
            x,
            signal: vec![1.0; n],
            background: vec![0.5; n],
            subtracted: vec![0.5; n],
        }
    }

    #[test]
    fn power_law_summary_lists_parameters() {
        let result = BackgroundFile {
            tool: "eelsbg".to_string(),
            generated: Utc::now(),
            source: "edge.csv".to_string(),
            model: BackgroundModel::PowerLaw {
                params: PowerLawParams { exponent: -3.0, log_intercept: 0.0 },
                range: PixelRange::new(40, 90),
            },
            degraded: false,
            grid: grid(AxisUnit::Pixel, vec![40.0, 41.0, 42.0]),
        };

        let txt = format_run_summary(&result);
        assert!(txt.starts_with("=== eelsbg - power law background ===\n"), "{txt}");
        assert!(txt.contains("Source: edge.csv\n"));
        assert!(txt.contains("Window: pixels 40:90 (n=50)\n"));
        assert!(txt.contains("- r    : -3.000000\n"));
        assert!(txt.contains("- A    : 1.000000e0\n"), "{txt}");
        assert!(txt.contains("Output: 3 channels, pixels [40, 42]\n"));
        assert!(!txt.contains("WARNING"));
    }

    #[test]
    fn degraded_power_law_is_flagged() {
        let result = BackgroundFile {
            tool: "eelsbg".to_string(),
            generated: Utc::now(),
            source: "hot.csv".to_string(),
            model: BackgroundModel::PowerLaw {
                params: PowerLawParams { exponent: 900.0, log_intercept: 1.0 },
                range: PixelRange::new(1, 3),
            },
            degraded: true,
            grid: grid(AxisUnit::Pixel, vec![1.0, 2.0]),
        };

        assert!(format_run_summary(&result).contains("WARNING: background could not be evaluated"));
    }

    #[test]
    fn gauss_lorentz_summary_shows_uncertainties_when_present() {
        let params = GlParams { x0: 0.01, sigma: 0.2, w: 0.25, n: 0.6, c: 1.0 };
        let mut result = BackgroundFile {
            tool: "eelsbg".to_string(),
            generated: Utc::now(),
            source: "zlp.csv".to_string(),
            model: BackgroundModel::GaussLorentz {
                params,
                std_errors: Some(GlParams { x0: 1e-4, sigma: 2e-4, w: 3e-4, n: 1e-3, c: 5e-4 }),
                pre: PixelRange::new(0, 150),
                post: PixelRange::new(150, 250),
                solver: SolverReport { iterations: 12, evaluations: 80, sse: 1e-6, rmse: 1e-4, n: 250 },
            },
            degraded: false,
            grid: grid(AxisUnit::Ev, vec![-3.0, 2.0]),
        };

        let txt = format_run_summary(&result);
        assert!(txt.contains("Windows: pre=0:150 post=150:250 (n=250)\n"), "{txt}");
        assert!(txt.contains("iterations=12 evaluations=80"));
        assert!(txt.contains("+/- 1.00e-4"), "{txt}");
        assert!(txt.contains("Output: 2 channels, energy [-3.000, 2.000] eV\n"));

        if let BackgroundModel::GaussLorentz { std_errors, .. } = &mut result.model {
            *std_errors = None;
        }
        let txt = format_run_summary(&result);
        assert!(txt.contains("(uncertainties unavailable)"));
        assert!(!txt.contains("+/-"));
    }
}
