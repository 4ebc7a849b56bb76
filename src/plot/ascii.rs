//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! The plot is drawn in the x-y plane:
//! - observed points: `o`
//! - fitted curve: `-` line through densely sampled `(x_pred, y_pred)`
//! - highlighted points (largest errors): `W`

use std::collections::HashSet;

use crate::domain::{FitFile, Observation, SampleRow};

/// Render observations and a sampled fitted curve.
pub fn render_fit_plot(
    observations: &[Observation],
    curve: &[SampleRow],
    highlight: &[usize],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points = observations.iter().map(|o| (o.x, o.y));
    let curve_points: Vec<(f64, f64)> = curve.iter().map(|r| (r.x_pred, r.y_pred)).collect();

    let xs = points.clone().map(|p| p.0).chain(curve_points.iter().map(|p| p.0));
    let ys = points.clone().map(|p| p.1).chain(curve_points.iter().map(|p| p.1));
    let (x_min, x_max) = axis_range(xs).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = axis_range(ys).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = pad_range(x_min, x_max, 0.02);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    let mut prev = None;
    for &(x, y) in &curve_points {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let cx = map_x(x, x_min, x_max, width);
        let cy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, cx, cy, '-'),
            None => grid[cy][cx] = '-',
        }
        prev = Some((cx, cy));
    }

    let highlight: HashSet<usize> = highlight.iter().copied().collect();
    for (i, (x, y)) in points.enumerate() {
        let cx = map_x(x, x_min, x_max, width);
        let cy = map_y(y, y_min, y_max, height);
        grid[cy][cx] = if highlight.contains(&i) { 'W' } else { 'o' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.2}, {x_max:.2}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// Render a saved fit file (observations + stored curve).
pub fn render_fit_file_plot(fit_file: &FitFile, width: usize, height: usize) -> String {
    render_fit_plot(&fit_file.observations, &fit_file.curve, &[], width, height)
}

fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() {
        Some((min - 0.5, min + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
