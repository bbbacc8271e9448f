//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer behind every fit: an argmin-backed
//! log-likelihood maximizer, finite-difference derivatives, bounded ↔
//! unbounded parameter transforms, and a single error/result surface.
//! Fit objectives implement a log-likelihood over internal coordinates,
//! choose tolerances, and obtain fitted values and diagnostics without
//! touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Maximize log-likelihoods `ℓ(θ)` with L-BFGS (`loglik_optimizer`),
//!   with More–Thuente or Hager–Zhang line searches and configurable
//!   stopping criteria.
//! - Classify solver terminations into integer fit status codes
//!   (`0` converged, `1` iteration limit, `2` failure, `3` not terminated).
//! - Supply finite-difference gradients, tuned steps, and value-based
//!   Hessians for covariance estimation.
//! - Map bounded parameters into unconstrained coordinates
//!   (`numerical_stability`).
//! - Normalize configuration issues, numerical failures, model errors, and
//!   backend solver errors into one enum (`errors::OptError`) with a common
//!   result alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate in an unconstrained parameter space `θ`; invalid
//!   states are reported as `OptError`, not panics.
//! - Objectives report model failures (bad shapes, missing parameters) as
//!   recoverable errors that abort the current solver run only.
//!
//! Conventions
//! -----------
//! - All solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing
//!   outcomes are expressed in terms of `ℓ`. Chi-square fits are expressed
//!   as `ℓ = −χ²/2`.
//! - Parameters, gradients, and Hessians use the `ndarray` aliases `Theta`,
//!   `Grad`, and `Hessian`.
//! - Progress output is opt-in: the `obs_slog` feature plus `verbose`
//!   options attach a terminal observer; otherwise this layer is silent.
//!
//! Downstream usage
//! ----------------
//! - `explorer` implements `LogLikelihood` for its unbinned and binned fit
//!   objectives and calls `maximize` once per fit pass and per MINOS probe.
//! - `inference` consumes the finite-difference Hessians.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules cover solver wiring, status mapping,
//!   finite-difference accuracy, transform round trips, and error
//!   conversions; the explorer tests exercise full fits.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use spectrum_explorer::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
