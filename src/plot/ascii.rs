//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `x`
//! - model curve: `-` line
//! - optional vertical markers (transition temperatures): `|`

use crate::domain::{CurveGrid, Observation};

/// Observed χT overlaid on a predicted curve.
pub fn render_fit_plot(
    observations: &[Observation],
    curve: &CurveGrid,
    width: usize,
    height: usize,
) -> String {
    let points: Vec<(f64, f64)> = observations
        .iter()
        .map(|o| (o.temperature, o.chi_t))
        .collect();
    let curve_points = grid_points(curve);
    render_plot(&points, &curve_points, &[], "chi_t", width, height)
}

/// A saved curve on its own (no observations at hand).
pub fn render_curve_plot(curve: &CurveGrid, width: usize, height: usize) -> String {
    render_plot(&[], &grid_points(curve), &[], "chi_t", width, height)
}

/// A sweep quantity against temperature, with vertical markers.
pub fn render_series_plot(
    temperatures: &[f64],
    values: &[f64],
    markers: &[f64],
    label: &str,
    width: usize,
    height: usize,
) -> String {
    let curve: Vec<(f64, f64)> = temperatures
        .iter()
        .copied()
        .zip(values.iter().copied())
        .collect();
    render_plot(&[], &curve, markers, label, width, height)
}

fn grid_points(curve: &CurveGrid) -> Vec<(f64, f64)> {
    curve
        .temperature
        .iter()
        .copied()
        .zip(curve.chi_t.iter().copied())
        .collect()
}

fn render_plot(
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    markers: &[f64],
    label: &str,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = x_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Markers first, then the curve, then points on top.
    for &m in markers {
        if m.is_finite() && m >= t_min && m <= t_max {
            let x = map_x(m, t_min, t_max, width);
            for row in grid.iter_mut() {
                row[x] = '|';
            }
        }
    }
    draw_curve(&mut grid, curve, t_min, t_max, y_min, y_max);
    for &(t, y) in points {
        if t.is_finite() && y.is_finite() {
            let x = map_x(t, t_min, t_max, width);
            let yy = map_y(y, y_min, y_max, height);
            grid[yy][x] = 'x';
        }
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: T=[{t_min:.3}, {t_max:.3}] K | {label}=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    bounds(points.iter().chain(curve).map(|&(t, _)| t))
}

fn y_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    bounds(points.iter().chain(curve).map(|&(_, y)| y))
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        if !(t.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else if grid[yy][x] == ' ' {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are painted.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let observations = vec![
            Observation {
                temperature: 1.0,
                chi_t: 100.0,
            },
            Observation {
                temperature: 10.0,
                chi_t: 110.0,
            },
        ];
        let curve = CurveGrid {
            temperature: (1..=10).map(f64::from).collect(),
            chi_t: vec![100.0; 10],
        };

        let txt = render_fit_plot(&observations, &curve, 10, 5);
        let expected = concat!(
            "Plot: T=[1.000, 10.000] K | chi_t=[99.50, 110.50]\n",
            "         x\n",
            "          \n",
            "          \n",
            "          \n",
            "x---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn markers_draw_full_columns() {
        let t = [0.0, 9.0];
        let v = [0.0, 0.0];
        let txt = render_series_plot(&t, &v, &[3.0], "c", 10, 5);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.chars().nth(3) == Some('|')));
    }
}
