//! statistical_tests — goodness of fit and discovery significance.
//!
//! Purpose
//! -------
//! Collect the statistical routines run after a spectrum fit: the binned
//! χ² statistic and goodness-of-fit test, the asymptotic
//! profile-likelihood-ratio significance, and its toy-based counterpart,
//! together with shared input validation and error handling.
//!
//! Key behaviors
//! -------------
//! - [`chi_square_test`] bins a dataset, sums `(n − μ)²/σ²` over bins with
//!   non-zero variance, and reports `(statistic, ndf, p-value, passed)` as a
//!   [`Chi2TestOutcome`]; the per-bin variance follows a [`BinErrors`]
//!   policy.
//! - [`asymptotic_significance`] fits the background-only and
//!   signal+background hypotheses of a model bundle and converts the clipped
//!   `q₀` into `Z = √q₀`.
//! - [`toy_significance`] builds seeded, parallel toy ensembles for both
//!   hypotheses and reports the empirical p-value of the observed `q₀`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Degrees of freedom are `used_bins − n_free` and must be positive.
//! - `q₀ ≥ 0` and `Z ≥ 0` in every outcome.
//! - Routines report failures via [`StatResult`] and never panic on
//!   user-facing invalid inputs.
//!
//! Conventions
//! -----------
//! - Upper-tail probabilities are `1 − CDF` of the `statrs` reference
//!   distribution, clamped to `[0, 1]`.
//! - Failures of internal fits are wrapped as [`StatError::Fit`].
//!
//! Downstream usage
//! ----------------
//! ```rust,ignore
//! use spectrum_explorer::statistical_tests::prelude::*;
//!
//! let asym = asymptotic_significance(&bundle, &MLEOptions::default())?;
//! let toys = toy_significance(&bundle, &ToyOptions::new(500, 500, 42, true)?, &opts)?;
//! println!("Z = {:.2} (asymptotic), {:.2} (toys)", asym.z(), toys.z);
//! ```
//!
//! Testing notes
//! -------------
//! - [`chi_square`] tests Garwood intervals, error policies, and hand
//!   computed statistics; [`significance`] and [`toys`] run end-to-end on
//!   small seeded samples.

pub mod chi_square;
pub mod errors;
pub mod significance;
pub mod toys;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::chi_square::{
    BinErrors, Chi2TestOutcome, ChiSquareData, GARWOOD_ALPHA, chi_square_test, garwood_interval,
};
pub use self::errors::{StatError, StatResult};
pub use self::significance::{SignificanceOutcome, asymptotic_significance, q0_from_fits};
pub use self::toys::{ToyEnsemble, ToyOptions, ToySignificance, toy_significance, z_from_p};
pub use self::validation::{validate_alpha, validate_bins, validate_toy_counts};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use spectrum_explorer::statistical_tests::prelude::*;
//
// to import the main statistical-testing surface in a single line.

pub mod prelude {
    pub use super::chi_square::{BinErrors, Chi2TestOutcome, chi_square_test};
    pub use super::errors::{StatError, StatResult};
    pub use super::significance::{SignificanceOutcome, asymptotic_significance};
    pub use super::toys::{ToyOptions, ToySignificance, toy_significance};
}
