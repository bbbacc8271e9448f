//! inference::hessian — covariance, standard errors, and EDM from curvature.
//!
//! Purpose
//! -------
//! Convert the finite-difference Hessian of a fit cost into a parameter
//! covariance matrix using an eigen-based pseudoinverse, and provide the
//! matrix helpers the fit engine needs afterwards (sandwich correction,
//! correlations, standard errors, EDM).
//!
//! Key behaviors
//! -------------
//! - [`observed_covariance`] tunes finite-difference steps, calls
//!   [`compute_hessian`], and inverts the result.
//! - [`covariance_from_hessian`] copies the Hessian into a
//!   `nalgebra::DMatrix` (`fill_dmatrix`), takes its symmetric
//!   eigendecomposition, and forms `Σ_k q_k q_kᵀ / λ_k` over the retained
//!   eigenvalues.
//! - [`sandwich`] forms `V·C·V` for weighted-data fits.
//!
//! Invariants & assumptions
//! ------------------------
//! - Hessians are finite and symmetric (enforced by `compute_hessian`).
//! - Eigenvalues `λ ≤ EIGEN_EPS · λ_max` are treated as zero; the number of
//!   dropped directions is reported in [`Covariance::dropped`] so callers
//!   can flag an unreliable covariance.
//!
//! Conventions
//! -----------
//! - No explicit matrix inverse is formed.
//! - Errors are reported via [`InferenceResult<T>`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover analytic inverses of quadratic costs, rank-deficient
//!   curvature, the sandwich product, and correlation/EDM helpers.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::{
        errors::OptResult,
        loglik_optimizer::finite_diff::{compute_hessian, tune_steps},
        numerical_stability::transformations::EIGEN_EPS,
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Covariance estimate obtained from a curvature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    pub matrix: Array2<f64>,
    /// Number of eigen directions dropped as numerically flat or negative.
    pub dropped: usize,
    /// Smallest eigenvalue of the curvature matrix.
    pub min_eigenvalue: f64,
}

impl Covariance {
    /// `true` when every curvature direction was positive and retained.
    pub fn is_full_rank(&self) -> bool {
        self.dropped == 0
    }
}

/// Covariance of the minimum of `cost` at `theta_hat`.
///
/// `initial_steps` seeds the per-coordinate step search and `limits` keeps
/// the finite-difference probes inside each coordinate's admissible range.
///
/// # Errors
/// - [`InferenceError::Optimizer`] when the cost fails to evaluate.
/// - [`InferenceError::NotPositiveDefinite`] when no curvature direction
///   is positive.
pub fn observed_covariance<F>(
    cost: &F, theta_hat: &Array1<f64>, initial_steps: &Array1<f64>, limits: &[(f64, f64)],
) -> InferenceResult<Covariance>
where
    F: Fn(&Array1<f64>) -> OptResult<f64>,
{
    let steps = tune_steps(cost, theta_hat, initial_steps, limits)?;
    let hess = compute_hessian(cost, theta_hat, &steps)?;
    covariance_from_hessian(&hess)
}

/// Truncated-eigen pseudoinverse of a symmetric Hessian.
///
/// # Errors
/// - [`InferenceError::DimensionMismatch`] for a non-square input.
/// - [`InferenceError::NotPositiveDefinite`] when no eigenvalue is positive.
pub fn covariance_from_hessian(hess: &Array2<f64>) -> InferenceResult<Covariance> {
    let n = hess.nrows();
    if hess.ncols() != n {
        return Err(InferenceError::DimensionMismatch {
            expected: n,
            found: (hess.nrows(), hess.ncols()),
        });
    }
    if n == 0 {
        return Ok(Covariance { matrix: Array2::zeros((0, 0)), dropped: 0, min_eigenvalue: 0.0 });
    }
    let mut hess_nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(hess, &mut hess_nalg);
    let eigen_decomp = hess_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let max_eigenvalue = eigenvals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_eigenvalue = eigenvals.iter().cloned().fold(f64::INFINITY, f64::min);
    if !(max_eigenvalue > 0.0) {
        return Err(InferenceError::NotPositiveDefinite { max_eigenvalue });
    }
    let cutoff = EIGEN_EPS * max_eigenvalue;
    let mut matrix = Array2::<f64>::zeros((n, n));
    let mut dropped = 0;
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda <= cutoff {
            dropped += 1;
            continue;
        }
        for i in 0..n {
            let coeff = q[(i, k)] / lambda;
            for j in 0..n {
                matrix[[i, j]] += coeff * q[(j, k)];
            }
        }
    }
    Ok(Covariance { matrix, dropped, min_eigenvalue })
}

/// Sandwich product `V·C·V`.
///
/// # Errors
/// [`InferenceError::DimensionMismatch`] when `v` and `c` differ in shape.
pub fn sandwich(v: &Array2<f64>, c: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    if v.dim() != c.dim() || v.nrows() != v.ncols() {
        return Err(InferenceError::DimensionMismatch { expected: v.nrows(), found: c.dim() });
    }
    Ok(v.dot(c).dot(v))
}

/// Square roots of the covariance diagonal; negative variances map to zero.
pub fn standard_errors(cov: &Array2<f64>) -> Array1<f64> {
    cov.diag().mapv(|v| v.max(0.0).sqrt())
}

/// Correlation matrix; rows/columns with zero variance are left at zero
/// (with a unit diagonal).
pub fn correlation(cov: &Array2<f64>) -> Array2<f64> {
    let se = standard_errors(cov);
    let n = cov.nrows();
    let mut corr = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            if i == j {
                corr[[i, j]] = 1.0;
            } else if se[i] > 0.0 && se[j] > 0.0 {
                corr[[i, j]] = (cov[[i, j]] / (se[i] * se[j])).clamp(-1.0, 1.0);
            }
        }
    }
    corr
}

/// Estimated distance to minimum `½ gᵀ V g`.
pub fn edm(grad: &Array1<f64>, cov: &Array2<f64>) -> f64 {
    0.5 * grad.dot(&cov.dot(grad))
}

// ---- Helper methods ----

fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    let n = src.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                dst[(i, i)] = src[[i, i]];
            } else {
                let avg = 0.5 * (src[[i, j]] + src[[j, i]]);
                dst[(i, j)] = avg;
                dst[(j, i)] = avg;
            }
        }
    }
}
