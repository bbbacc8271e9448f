//! numerical_stability — parameter transforms and shared numeric tolerances.
//!
//! Purpose
//! -------
//! Keep the optimizer in unconstrained coordinates while model parameters
//! respect their `[min, max]` limits, and centralize the small tolerances
//! used when inverting curvature matrices.
//!
//! Key behaviors
//! -------------
//! - [`BoundTransform`] maps between bounded external values and unbounded
//!   internal coordinates (sine for two-sided limits, square root for
//!   one-sided limits).
//! - [`EIGEN_EPS`] and [`GENERAL_TOL`] are shared by the covariance code
//!   and boundary nudging.
//!
//! Invariants & assumptions
//! ------------------------
//! - Transforms are pure functions of `f64`; they never allocate, log, or
//!   fail. Limits are validated by the parameter layer.
//! - Every internal coordinate maps into the closed external interval.
//!
//! Downstream usage
//! ----------------
//! - The fit objectives build one transform per free parameter and convert
//!   whole vectors at the start and end of every pass.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover round trips, limit adherence,
//!   and boundary nudging.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{BoundTransform, EIGEN_EPS, GENERAL_TOL};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use spectrum_explorer::optimization::numerical_stability::prelude::*;
//
// to import the numerical-stability surface in a single line.

pub mod prelude {
    pub use super::transformations::{BoundTransform, EIGEN_EPS, GENERAL_TOL};
}
