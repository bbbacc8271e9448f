//! spectrum_explorer — fitting and significance engine for invariant-mass
//! spectra.
//!
//! Purpose
//! -------
//! Serve as the crate root: fit a parametric signal-plus-background
//! density to binned or unbinned mass data, partition the mass range into
//! signal and sideband regions, estimate parameter uncertainties, test the
//! goodness of fit, and export model bundles for asymptotic and toy-based
//! discovery significance.
//!
//! Key behaviors
//! -------------
//! - Re-export the subtrees as the public surface:
//!   - [`spectrum`]: observables, datasets, parameters, and models.
//!   - [`optimization`]: the L-BFGS log-likelihood maximizer and
//!     finite-difference helpers.
//!   - [`inference`]: covariance from fit curvature.
//!   - [`explorer`]: regions, fit protocols, MINOS, plot data, bundles.
//!   - [`statistical_tests`]: χ² goodness of fit and significance.
//!
//! Invariants & assumptions
//! ------------------------
//! - All computation is synchronous; only toy ensembles run in parallel,
//!   and each toy owns its model copies and random stream.
//! - Library code does not log unless the `obs_slog` feature is enabled and
//!   the optimizer options ask for verbose output.
//!
//! Conventions
//! -----------
//! - Each subtree has an `errors` module with its own error enum and
//!   `Result` alias, and a `prelude` module with its main surface.
//!
//! Downstream usage
//! ----------------
//! ```rust,ignore
//! use spectrum_explorer::{explorer::DataExplorer, statistical_tests::prelude::*};
//!
//! let mut ex = DataExplorer::new("Bs", data, model)?;
//! ex.fit(false, &[])?;
//! let bundle = ex.prepare_workspace(&["n_sig"], &["n_bkg", "k"])?;
//! let z = asymptotic_significance(&bundle, &Default::default())?.z();
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code in every module; the end-to-end
//!   pipeline is covered in `tests/integration_spectrum_pipeline.rs`.

pub mod explorer;
pub mod inference;
pub mod optimization;
pub mod spectrum;
pub mod statistical_tests;
