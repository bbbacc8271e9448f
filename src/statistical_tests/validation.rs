//! statistical_tests::validation — shared input guards for test routines.
//!
//! Purpose
//! -------
//! Centralize the cheap argument checks run at the top of the goodness-of-fit
//! and significance entry points, before any binning, sampling, or fitting
//! is performed.
//!
//! Conventions
//! -----------
//! - Pure validation: no allocation beyond error construction.
//! - Failures map onto [`StatError`] variants that carry the offending value.
use crate::statistical_tests::errors::{StatError, StatResult};

/// Check that a significance threshold lies in the open interval (0, 1).
///
/// # Errors
/// [`StatError::InvalidThreshold`] otherwise (NaN included).
pub fn validate_alpha(alpha: f64) -> StatResult<()> {
    if alpha > 0.0 && alpha < 1.0 { Ok(()) } else { Err(StatError::InvalidThreshold(alpha)) }
}

/// Check an optional bin-count override; `None` passes through.
///
/// # Errors
/// [`StatError::InvalidBins`] for `Some(0)`.
pub fn validate_bins(bins: Option<usize>) -> StatResult<Option<usize>> {
    match bins {
        Some(0) => Err(StatError::InvalidBins(0)),
        other => Ok(other),
    }
}

/// Check that at least one null-hypothesis toy is requested.
///
/// # Errors
/// [`StatError::InvalidToyCount`] for `n_null == 0`.
pub fn validate_toy_counts(n_null: usize) -> StatResult<()> {
    if n_null == 0 { Err(StatError::InvalidToyCount) } else { Ok(()) }
}
