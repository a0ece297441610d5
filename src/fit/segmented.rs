//! One-breakpoint segmented regression (Tcrit).
//!
//! Model on the fit window:
//!
//! ```text
//! y = a + b x + c (x - ψ)₊
//! ```
//!
//! `ψ` is estimated with Muggeo's iterative linearization: for the current
//! `ψ` we regress `y` on `[1, x, U, V]` with `U = (x - ψ)₊` and
//! `V = -1{x > ψ}`; the `V` coefficient `γ` approximates `c (ψ* - ψ)`, so the
//! update is `ψ ← ψ + γ / c`. Each update is step-halved until the SSE of the
//! three-column model does not increase.
//!
//! The iteration is started from a fixed list of window quantiles and the
//! converged candidate with the lowest SSE is kept, so the result is a pure
//! function of the input.
//!
//! At convergence `SE(ψ) = SE(γ) / |c|` from the four-column fit.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{AnalysisConfig, FitCurve, Landmarks, ScaledSeries, TcritResult};
use crate::error::WellFailure;
use crate::math::{fit_ols, quantile, residual_sum_of_squares, round_to, solve_least_squares};

/// Number of coefficients in the linearized model.
const N_PARAMS: usize = 4;
/// Minimum points required on each side of the breakpoint.
const MIN_SIDE_POINTS: usize = 2;
const MAX_HALVINGS: usize = 10;
/// Starting breakpoints, as quantiles of the window temperatures.
const START_QUANTILES: [f64; 5] = [0.5, 0.25, 0.75, 1.0 / 3.0, 2.0 / 3.0];

/// Stopping rules for the breakpoint iteration.
#[derive(Debug, Clone, Copy)]
pub struct SegmentedOptions {
    pub min_points: usize,
    pub max_iterations: usize,
    /// Convergence when `|Δψ| <= tolerance * (x_max - x_min)`.
    pub tolerance: f64,
}

impl From<&AnalysisConfig> for SegmentedOptions {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            min_points: cfg.min_window_points,
            max_iterations: cfg.max_iterations,
            tolerance: cfg.tolerance,
        }
    }
}

impl Default for SegmentedOptions {
    fn default() -> Self {
        SegmentedOptions::from(&AnalysisConfig::default())
    }
}

/// A converged breakpoint model.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointFit {
    pub psi: f64,
    pub psi_se: f64,
    pub intercept: f64,
    pub slope_left: f64,
    /// Slope change at `ψ` (`c`).
    pub slope_diff: f64,
    pub sse: f64,
    /// SSE of the plain straight-line fit over the same window.
    pub linear_sse: f64,
    pub iterations: usize,
}

impl BreakpointFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope_left * x + self.slope_diff * (x - self.psi).max(0.0)
    }

    pub fn slope_right(&self) -> f64 {
        self.slope_left + self.slope_diff
    }
}

/// Points of the scaled series inside `[T50 - prebuffer, T50 + postbuffer]`.
pub fn fit_window(
    series: &ScaledSeries,
    landmarks: &Landmarks,
    prebuffer: f64,
    postbuffer: f64,
) -> (Vec<f64>, Vec<f64>) {
    let lo = landmarks.t50 - prebuffer;
    let hi = landmarks.t50 + postbuffer;
    series
        .points
        .iter()
        .filter(|p| p.temperature >= lo && p.temperature <= hi)
        .map(|p| (p.temperature, p.scaled))
        .unzip()
}

/// Window selection + breakpoint fit for one well.
pub fn estimate_tcrit(
    series: &ScaledSeries,
    landmarks: &Landmarks,
    config: &AnalysisConfig,
) -> Result<(TcritResult, FitCurve), WellFailure> {
    let (x, y) = fit_window(series, landmarks, config.prebuffer, config.postbuffer);
    let fit = fit_breakpoint(&x, &y, &SegmentedOptions::from(config))?;

    debug!(
        well = %series.well,
        psi = fit.psi,
        psi_se = fit.psi_se,
        iterations = fit.iterations,
        sse = fit.sse,
        linear_sse = fit.linear_sse,
        "breakpoint fit converged"
    );

    let fitted = x.iter().map(|&t| fit.predict(t)).collect();
    let result = TcritResult {
        tcrit: round_to(fit.psi, 2),
        tcrit_se: round_to(fit.psi_se, 2),
    };
    let curve = FitCurve {
        temperatures: x,
        observed: y,
        fitted,
        breakpoint: fit.psi,
    };
    Ok((result, curve))
}

/// Fit `y = a + b x + c (x - ψ)₊` on points ordered by `x`.
pub fn fit_breakpoint(x: &[f64], y: &[f64], opts: &SegmentedOptions) -> Result<BreakpointFit, WellFailure> {
    let n = x.len();
    if n != y.len() {
        return Err(WellFailure::convergence("temperature/value length mismatch"));
    }
    if n < opts.min_points {
        return Err(WellFailure::convergence(format!(
            "only {n} points in fit window (need at least {})",
            opts.min_points
        )));
    }
    if n <= N_PARAMS {
        return Err(WellFailure::convergence(format!(
            "{n} points leave no residual degrees of freedom"
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(WellFailure::convergence("non-finite value in fit window"));
    }

    let linear_sse = linear_sse(x, y)
        .ok_or_else(|| WellFailure::convergence("straight-line fit is singular"))?;

    let mut best: Option<BreakpointFit> = None;
    let mut first_err: Option<String> = None;
    let mut tried: Vec<f64> = Vec::with_capacity(START_QUANTILES.len());

    for &q in &START_QUANTILES {
        let Some(psi0) = quantile(x, q) else { continue };
        if tried.iter().any(|&p| (p - psi0).abs() < 1e-12) {
            continue;
        }
        tried.push(psi0);

        match iterate_from(x, y, psi0, opts) {
            Ok((psi, iterations)) => match finalize(x, y, psi, iterations, linear_sse) {
                Ok(fit) => {
                    if best.as_ref().map_or(true, |b| fit.sse < b.sse) {
                        best = Some(fit);
                    }
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            },
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }

    best.ok_or_else(|| {
        WellFailure::convergence(first_err.unwrap_or_else(|| "no valid starting breakpoint".to_string()))
    })
}

/// Muggeo iteration from `psi0`; returns the converged `ψ` and iteration count.
fn iterate_from(x: &[f64], y: &[f64], psi0: f64, opts: &SegmentedOptions) -> Result<(f64, usize), String> {
    let (x_min, x_max) = x_range(x);
    let span = x_max - x_min;
    if !(span > 0.0) {
        return Err("fit window spans a single temperature".to_string());
    }

    let mut psi = psi0;
    if !has_support(x, psi) {
        return Err(format!("starting breakpoint {psi:.3} leaves too few points on one side"));
    }
    let mut dev = segmented_sse(x, y, psi).ok_or_else(|| "singular segmented design".to_string())?;

    for iteration in 1..=opts.max_iterations {
        let coef = solve_least_squares(&design(x, psi, true), &DVector::from_column_slice(y))
            .ok_or_else(|| "singular linearized design".to_string())?;
        let slope_diff = coef[2];
        let gamma = coef[3];
        if slope_diff.abs() < 1e-10 {
            return Err("slope change vanished (no breakpoint)".to_string());
        }
        let step = gamma / slope_diff;

        let mut accepted: Option<(f64, f64)> = None;
        let mut supported = false;
        let mut h = 1.0;
        for _ in 0..=MAX_HALVINGS {
            let candidate = psi + h * step;
            if has_support(x, candidate) {
                supported = true;
                if let Some(d) = segmented_sse(x, y, candidate) {
                    if d <= dev {
                        accepted = Some((candidate, d));
                        break;
                    }
                }
            }
            h *= 0.5;
        }

        // No halving lowers the SSE: `psi` is a local minimum along the step.
        let Some((next_psi, next_dev)) = accepted else {
            if supported || step.abs() <= opts.tolerance * span {
                return Ok((psi, iteration));
            }
            return Err(format!("breakpoint left the data range near {psi:.3}"));
        };

        let moved = (next_psi - psi).abs();
        psi = next_psi;
        dev = next_dev;
        if moved <= opts.tolerance * span || dev <= f64::EPSILON {
            return Ok((psi, iteration));
        }
    }

    Err(format!("no convergence after {} iterations", opts.max_iterations))
}

/// Final coefficients and `SE(ψ)` at a converged breakpoint.
fn finalize(x: &[f64], y: &[f64], psi: f64, iterations: usize, linear_sse: f64) -> Result<BreakpointFit, String> {
    let yv = DVector::from_column_slice(y);

    let reduced = design(x, psi, false);
    let coef = solve_least_squares(&reduced, &yv).ok_or_else(|| "singular segmented design".to_string())?;
    let sse = residual_sum_of_squares(&reduced, &yv, &coef);

    let full = fit_ols(&design(x, psi, true), &yv)
        .ok_or_else(|| "singular covariance for breakpoint standard error".to_string())?;
    let slope_diff = full.coefficients[2];
    if slope_diff.abs() < 1e-10 {
        return Err("slope change vanished (no breakpoint)".to_string());
    }
    let psi_se = full.std_error(3) / slope_diff.abs();
    if !psi_se.is_finite() {
        return Err("non-finite breakpoint standard error".to_string());
    }

    Ok(BreakpointFit {
        psi,
        psi_se,
        intercept: coef[0],
        slope_left: coef[1],
        slope_diff: coef[2],
        sse,
        linear_sse,
        iterations,
    })
}

/// `[1, x, (x - ψ)₊]`, plus `-1{x > ψ}` when `with_v`.
fn design(x: &[f64], psi: f64, with_v: bool) -> DMatrix<f64> {
    let cols = if with_v { 4 } else { 3 };
    DMatrix::from_fn(x.len(), cols, |i, j| match j {
        0 => 1.0,
        1 => x[i],
        2 => (x[i] - psi).max(0.0),
        _ => {
            if x[i] > psi {
                -1.0
            } else {
                0.0
            }
        }
    })
}

fn segmented_sse(x: &[f64], y: &[f64], psi: f64) -> Option<f64> {
    let xm = design(x, psi, false);
    let yv = DVector::from_column_slice(y);
    let beta = solve_least_squares(&xm, &yv)?;
    let sse = residual_sum_of_squares(&xm, &yv, &beta);
    sse.is_finite().then_some(sse)
}

fn linear_sse(x: &[f64], y: &[f64]) -> Option<f64> {
    let xm = DMatrix::from_fn(x.len(), 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let yv = DVector::from_column_slice(y);
    let beta = solve_least_squares(&xm, &yv)?;
    Some(residual_sum_of_squares(&xm, &yv, &beta))
}

fn has_support(x: &[f64], psi: f64) -> bool {
    if !psi.is_finite() {
        return false;
    }
    let left = x.iter().filter(|&&v| v <= psi).count();
    let right = x.len() - left;
    left >= MIN_SIDE_POINTS && right >= MIN_SIDE_POINTS
}

fn x_range(x: &[f64]) -> (f64, f64) {
    x.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hinge(x: &[f64], psi: f64, a: f64, b: f64, c: f64) -> Vec<f64> {
        x.iter().map(|&t| a + b * t + c * (t - psi).max(0.0)).collect()
    }

    fn grid(start: f64, end: f64, step: f64) -> Vec<f64> {
        let n = ((end - start) / step).round() as usize;
        (0..=n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn recovers_injected_breakpoint_without_noise() {
        let x = grid(28.0, 41.0, 0.5);
        let y = hinge(&x, 36.3, -0.1, 0.005, 0.12);
        let fit = fit_breakpoint(&x, &y, &SegmentedOptions::default()).unwrap();
        assert!((fit.psi - 36.3).abs() < 0.1, "psi={}", fit.psi);
        assert!(fit.psi_se.abs() < 0.01, "se={}", fit.psi_se);
        assert!((fit.slope_right() - 0.125).abs() < 1e-3);
        assert!(fit.sse < fit.linear_sse);
    }

    #[test]
    fn recovers_breakpoint_away_from_window_centre() {
        let x = grid(30.0, 43.0, 1.0);
        let y = hinge(&x, 40.4, 0.0, 0.0, 0.3);
        let fit = fit_breakpoint(&x, &y, &SegmentedOptions::default()).unwrap();
        assert!((fit.psi - 40.4).abs() < 0.1, "psi={}", fit.psi);
    }

    #[test]
    fn too_few_points_is_a_convergence_failure() {
        let x = [30.0, 31.0, 32.0];
        let y = [0.0, 0.1, 0.5];
        let err = fit_breakpoint(&x, &y, &SegmentedOptions::default()).unwrap_err();
        assert!(!err.is_degenerate());
        assert!(err.to_string().contains("only 3 points"));
    }

    #[test]
    fn straight_line_has_no_breakpoint() {
        let x = grid(30.0, 42.0, 1.0);
        let y: Vec<f64> = x.iter().map(|t| 0.05 * t - 1.0).collect();
        assert!(fit_breakpoint(&x, &y, &SegmentedOptions::default()).is_err());
    }

    #[test]
    fn repeated_fits_are_identical() {
        let x = grid(25.0, 38.0, 0.5);
        let y: Vec<f64> = hinge(&x, 33.0, 0.02, 0.001, 0.09)
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { 0.004 } else { -0.004 })
            .collect();
        let a = fit_breakpoint(&x, &y, &SegmentedOptions::default()).unwrap();
        let b = fit_breakpoint(&x, &y, &SegmentedOptions::default()).unwrap();
        assert_eq!(a, b);
        assert!((a.psi - 33.0).abs() < 0.5);
        assert!(a.psi_se > 0.0);
    }
}
