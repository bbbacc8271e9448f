//! inference — parameter covariance from fit curvature.
//!
//! Purpose
//! -------
//! Turn the curvature of a fit objective at its minimum into parameter
//! covariance, standard errors, correlations, and the estimated distance
//! to minimum. Weighted-data fits additionally get the sandwich
//! correction `V·C·V`.
//!
//! Key behaviors
//! -------------
//! - [`observed_covariance`] finite-differences the cost with tuned steps
//!   and inverts the Hessian through a truncated eigendecomposition.
//! - [`sandwich`], [`correlation`], [`standard_errors`], and [`edm`] are
//!   small matrix helpers over the resulting covariance.
//!
//! Invariants & assumptions
//! ------------------------
//! - Costs are negative log-likelihoods (or `χ²/2`), so the covariance is
//!   the inverse Hessian with no extra factor.
//! - Curvature matrices are symmetric; eigen directions with eigenvalues
//!   below `EIGEN_EPS · λ_max` are dropped and reported.
//!
//! Conventions
//! -----------
//! - Covariances are expressed in **external** parameter units over the
//!   free parameters of a fit, in the fit's free-parameter order.
//! - All functions are pure and return [`InferenceResult`] on failure.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`hessian`] cover analytic quadratic costs, rank
//!   deficiency, the sandwich product, and correlation/EDM helpers.

pub mod errors;
pub mod hessian;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{
    Covariance, correlation, covariance_from_hessian, edm, observed_covariance, sandwich,
    standard_errors,
};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use spectrum_explorer::inference::prelude::*;` to
// import the primary inference surface in a single line.

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hessian::{Covariance, observed_covariance, sandwich, standard_errors};
}
