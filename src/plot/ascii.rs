//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - background: `-` line
//! - signal: `.` points

use crate::domain::{AxisUnit, BackgroundFile};

/// Render signal and background of a result file.
pub fn render_ascii_plot(result: &BackgroundFile, width: usize, height: usize) -> String {
    let grid = &result.grid;
    let signal = zip_points(&grid.x, &grid.signal);
    let background = zip_points(&grid.x, &grid.background);
    let unit = match grid.x_unit {
        AxisUnit::Pixel => "px",
        AxisUnit::Ev => "eV",
    };
    render_plot(&signal, &background, unit, width, height)
}

fn zip_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter().zip(y).map(|(&x, &y)| (x, y)).collect()
}

fn render_plot(
    signal: &[(f64, f64)],
    background: &[(f64, f64)],
    unit: &str,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(signal, background).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(signal, background).unwrap_or((0.0, 1.0));
    let to_cell = |x: f64, y: f64| {
        let col = cell(x, x_min, x_max, width);
        // Row 0 is the top of the plot.
        let row = height - 1 - cell(y, y_min, y_max, height);
        (col, row)
    };

    let mut grid = vec![vec![' '; width]; height];

    // Draw the background first so signal points overlay it.
    let mut prev = None;
    for &(x, y) in background {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let here = to_cell(x, y);
        draw_segment(&mut grid, prev.unwrap_or(here), here, '-');
        prev = Some(here);
    }

    for &(x, y) in signal {
        if x.is_finite() && y.is_finite() {
            let (col, row) = to_cell(x, y);
            grid[row][col] = '.';
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.3}, {x_max:.3}] {unit} | y=[{y_min:.4e}, {y_max:.4e}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn finite_extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    (min.is_finite() && max.is_finite() && max > min).then_some((min, max))
}

fn x_range(a: &[(f64, f64)], b: &[(f64, f64)]) -> Option<(f64, f64)> {
    finite_extent(a.iter().chain(b).map(|&(x, _)| x))
}

/// Y extent with 5% headroom on both sides.
fn y_range(a: &[(f64, f64)], b: &[(f64, f64)]) -> Option<(f64, f64)> {
    let (min, max) = finite_extent(a.iter().chain(b).map(|&(_, y)| y))?;
    let pad = 0.05 * (max - min);
    Some((min - pad, max + pad))
}

/// Index of the cell holding `v` among `cells` equal bins over `[min, max]`.
fn cell(v: f64, min: f64, max: f64, cells: usize) -> usize {
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    (u * (cells - 1) as f64).round() as usize
}

/// Fill cells from `from` to `to`, one step per column or row, whichever is longer.
/// Cells already drawn are kept.
fn draw_segment(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let steps = from.0.abs_diff(to.0).max(from.1.abs_diff(to.1)).max(1);
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        let col = (from.0 as f64 + t * (to.0 as f64 - from.0 as f64)).round() as usize;
        let row = (from.1 as f64 + t * (to.1 as f64 - from.1 as f64)).round() as usize;
        if grid[row][col] == ' ' {
            grid[row][col] = ch;
        }
    }
}
