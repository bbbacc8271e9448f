//! loglik_optimizer — MLE-friendly, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide the solver layer for every fit pass. Callers implement
//! [`LogLikelihood`] over internal coordinates and invoke [`maximize`] to run
//! L-BFGS with a configurable line search, tolerances, and a
//! finite-difference gradient fallback.
//!
//! Key behaviors
//! -------------
//! - Convert log-likelihoods `ℓ(θ)` into argmin cost functions
//!   `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`].
//! - [`maximize`] validates the start with [`LogLikelihood::check`], builds a
//!   solver via [`builders`], runs it via [`run::run_lbfgs`], and returns an
//!   [`OptimOutcome`] carrying a [`Termination`] class and status code.
//! - [`finite_diff`] supplies gradients, tuned steps, and value-based
//!   Hessians; [`validation`] holds the shared shape/finiteness checks.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`LogLikelihood::value`] and [`LogLikelihood::grad`] report invalid
//!   inputs as [`OptError`] values, never panics.
//! - [`Tolerances`] and [`MLEOptions`] are validated on construction; their
//!   defaults are the fit defaults.
//!
//! Conventions
//! -----------
//! - Gradients exposed by [`LogLikelihood::grad`] are `∇ℓ(θ)`; the adapter
//!   flips signs for the cost.
//! - Errors bubble up as [`OptResult<T>`]; nothing here uses `unsafe`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover adapter sign conventions and the finite-difference
//!   fallback, builder wiring, status-code mapping, finite-difference
//!   accuracy, and end-to-end maximization of concave quadratics.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Termination, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use spectrum_explorer::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
