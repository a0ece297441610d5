//! Per-well PNG charts.
//!
//! Plot elements:
//! - scaled fluorescence from the window start up to Tmax: grey line
//! - observed points inside the fit window: blue dots
//! - fitted two-segment model: red line
//! - vertical markers: Tcrit (red), T50 (green), Tmax (black)
//!
//! Plotters is built without a font backend, so the chart carries no text;
//! the file name identifies the well.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{FitCurve, Landmarks, ScaledSeries};
use crate::error::AppError;

const SIZE: (u32, u32) = (800, 600);
const X_PAD: f64 = 0.5;
const Y_PAD: f64 = 0.05;

/// Render one well's fit to `path`.
pub fn render_well_png(
    path: &Path,
    series: &ScaledSeries,
    landmarks: &Landmarks,
    curve: &FitCurve,
) -> Result<(), AppError> {
    let (x0, x1) = x_bounds(curve, landmarks);
    let context: Vec<(f64, f64)> = series
        .points
        .iter()
        .filter(|p| p.temperature >= x0 && p.temperature <= x1)
        .map(|p| (p.temperature, p.scaled))
        .collect();
    let observed: Vec<(f64, f64)> = curve
        .temperatures
        .iter()
        .copied()
        .zip(curve.observed.iter().copied())
        .collect();
    let fitted: Vec<(f64, f64)> = curve
        .temperatures
        .iter()
        .copied()
        .zip(curve.fitted.iter().copied())
        .collect();
    let (y0, y1) = y_bounds(context.iter().chain(&observed).chain(&fitted).map(|&(_, y)| y));

    draw(path, (x0, x1), (y0, y1), &context, &observed, &fitted, curve.breakpoint, landmarks)
        .map_err(|e| AppError::output(format!("Failed to render plot '{}': {e}", path.display())))
}

fn draw(
    path: &Path,
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
    context: &[(f64, f64)],
    observed: &[(f64, f64)],
    fitted: &[(f64, f64)],
    tcrit: f64,
    landmarks: &Landmarks,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart.draw_series(LineSeries::new(context.iter().copied(), &RGBColor(170, 170, 170)))?;
    chart.draw_series(
        observed
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
    )?;
    chart.draw_series(LineSeries::new(fitted.iter().copied(), RED.stroke_width(2)))?;

    let markers = [
        (tcrit, RED.mix(0.8)),
        (landmarks.t50, GREEN.mix(0.8)),
        (landmarks.tmax, BLACK.mix(0.8)),
    ];
    for (t, color) in markers {
        chart.draw_series(LineSeries::new(vec![(t, y0), (t, y1)], color))?;
    }

    root.present()?;
    Ok(())
}

fn x_bounds(curve: &FitCurve, landmarks: &Landmarks) -> (f64, f64) {
    let mut lo = landmarks.t50.min(curve.breakpoint);
    let mut hi = landmarks.tmax.max(landmarks.t50);
    for &t in &curve.temperatures {
        lo = lo.min(t);
        hi = hi.max(t);
    }
    (lo - X_PAD, hi + X_PAD)
}

fn y_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 1.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo - Y_PAD, hi + Y_PAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_window_and_markers() {
        let curve = FitCurve {
            temperatures: vec![33.0, 34.0, 35.0],
            observed: vec![0.1, 0.2, 0.6],
            fitted: vec![0.1, 0.2, 0.6],
            breakpoint: 34.2,
        };
        let lm = Landmarks {
            t50: 35.0,
            tmax: 39.0,
            t50_index: 2,
            tmax_index: 6,
        };
        let (x0, x1) = x_bounds(&curve, &lm);
        assert_eq!((x0, x1), (32.5, 39.5));
        let (y0, y1) = y_bounds([-0.2, 0.5, 1.0].into_iter());
        assert!((y0 + 0.25).abs() < 1e-12);
        assert!((y1 - 1.05).abs() < 1e-12);
    }
}
