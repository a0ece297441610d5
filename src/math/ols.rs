//! Ordinary least squares.
//!
//! The breakpoint search solves many tiny regressions (2–4 columns, a few
//! dozen rows), so we keep two entry points:
//!
//! - `solve_least_squares`: coefficients only, SVD-based, used inside the
//!   iteration loop.
//! - `fit_ols`: coefficients + SSE + coefficient covariance, used once a
//!   breakpoint has been accepted and its standard error is needed.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    // `QR::solve` is meant for square systems; SVD handles tall design
    // matrices and tells us about rank deficiency through the tolerance.
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Result of a full OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: DVector<f64>,
    pub sse: f64,
    /// Residual degrees of freedom (`n - p`).
    pub df: usize,
    /// `σ² (XᵀX)⁻¹` with `σ² = SSE / df`.
    pub covariance: DMatrix<f64>,
}

impl OlsFit {
    pub fn std_error(&self, idx: usize) -> f64 {
        self.covariance[(idx, idx)].max(0.0).sqrt()
    }
}

/// Fit `y ~ X` and estimate the coefficient covariance.
///
/// Returns `None` when there are no residual degrees of freedom or `XᵀX` is
/// singular.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let n = x.nrows();
    let p = x.ncols();
    if n <= p {
        return None;
    }

    let coefficients = solve_least_squares(x, y)?;
    let sse = residual_sum_of_squares(x, y, &coefficients);

    let xtx = x.transpose() * x;
    let xtx_inv = xtx.try_inverse()?;
    let df = n - p;
    let sigma2 = sse / df as f64;
    let covariance = xtx_inv * sigma2;
    if covariance.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(OlsFit {
        coefficients,
        sse,
        df,
        covariance,
    })
}

/// `Σ (y - Xβ)²`.
pub fn residual_sum_of_squares(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    let fitted = x * beta;
    (y - fitted).norm_squared()
}
