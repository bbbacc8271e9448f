//! Unified error handling for covariance estimation.
//!
//! `InferenceError` groups the failures that can occur when turning fit
//! curvature into parameter uncertainties; `InferenceResult<T>` is the
//! common alias.
use crate::optimization::errors::OptError;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Curvature ----
    /// No eigenvalue of the curvature matrix is positive.
    NotPositiveDefinite {
        max_eigenvalue: f64,
    },

    /// Matrix shapes disagree.
    DimensionMismatch {
        expected: usize,
        found: (usize, usize),
    },

    // ---- Upstream ----
    /// Finite-difference evaluation of the objective failed.
    Optimizer(OptError),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Optimizer(err)
    }
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Curvature ----
            InferenceError::NotPositiveDefinite { max_eigenvalue } => write!(
                f,
                "Inference Error: curvature matrix has no positive eigenvalue (max = {max_eigenvalue})"
            ),
            InferenceError::DimensionMismatch { expected, found } => write!(
                f,
                "Inference Error: expected a {expected}x{expected} matrix, found {}x{}",
                found.0, found.1
            ),

            // ---- Upstream ----
            InferenceError::Optimizer(err) => write!(f, "Inference Error: {err}"),
        }
    }
}
