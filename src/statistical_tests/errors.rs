//! statistical_tests::errors — error types for goodness-of-fit and
//! significance routines.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias shared by the chi-square test,
//! the asymptotic significance, and the toy-based significance. Failures
//! of the fits those routines run internally are carried through a boxed
//! [`ExplorerError`] so callers see the original cause.
//!
//! Conventions
//! -----------
//! - Messages are phrased in terms of domain constraints ("ndf must be
//!   positive", "alpha must lie in (0, 1)") rather than low-level details.
//! - Non-convergence of a fit is never an error here; it is reported in the
//!   outcome structs.
use crate::{explorer::errors::ExplorerError, spectrum::errors::ModelError};

pub type StatResult<T> = Result<T, StatError>;

/// StatError — failures of the statistical test routines.
///
/// Variants
/// --------
/// - `InvalidDegreesOfFreedom { used_bins, n_free }`
///   The number of used bins does not exceed the number of free parameters.
/// - `InvalidThreshold(alpha)`
///   Significance threshold outside the open interval (0, 1).
/// - `InvalidBins(bins)`
///   A bin-count override of zero.
/// - `BinMismatch { expected, found }`
///   Model bin integrals and histogram disagree in length.
/// - `EmptyToyEnsemble`
///   Every null toy failed or was discarded.
/// - `InvalidToyCount`
///   No null toys requested.
/// - `Distribution(text)`
///   A reference distribution could not be constructed.
/// - `NonFiniteStatistic(value)`
///   A test statistic evaluated to NaN or ±∞.
/// - `Model(ModelError)` / `Fit(Box<ExplorerError>)`
///   Wrapped failures from the model layer or from an internal fit.
#[derive(Debug, Clone, PartialEq)]
pub enum StatError {
    // ---- Input validation ----
    InvalidDegreesOfFreedom { used_bins: usize, n_free: usize },
    InvalidThreshold(f64),
    InvalidBins(usize),
    BinMismatch { expected: usize, found: usize },
    InvalidToyCount,

    // ---- Computation ----
    EmptyToyEnsemble,
    Distribution(String),
    NonFiniteStatistic(f64),

    // ---- Wrapped ----
    Model(ModelError),
    Fit(Box<ExplorerError>),
}

impl std::error::Error for StatError {}

impl std::fmt::Display for StatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatError::InvalidDegreesOfFreedom { used_bins, n_free } => write!(
                f,
                "Invalid degrees of freedom: {used_bins} used bins with {n_free} free \
                 parameters, ndf must be positive"
            ),
            StatError::InvalidThreshold(alpha) => {
                write!(f, "Invalid threshold {alpha}: alpha must lie in (0, 1)")
            }
            StatError::InvalidBins(bins) => write!(f, "Invalid bin count {bins}: must be positive"),
            StatError::BinMismatch { expected, found } => {
                write!(f, "Bin count mismatch: expected {expected}, found {found}")
            }
            StatError::InvalidToyCount => write!(f, "At least one null toy is required"),
            StatError::EmptyToyEnsemble => {
                write!(f, "No usable null toys: every toy failed or was discarded")
            }
            StatError::Distribution(text) => write!(f, "Reference distribution error: {text}"),
            StatError::NonFiniteStatistic(value) => {
                write!(f, "Test statistic is not finite: {value}")
            }
            StatError::Model(err) => write!(f, "Model error: {err}"),
            StatError::Fit(err) => write!(f, "Fit error: {err}"),
        }
    }
}

impl From<ModelError> for StatError {
    fn from(err: ModelError) -> Self {
        StatError::Model(err)
    }
}

impl From<ExplorerError> for StatError {
    fn from(err: ExplorerError) -> Self {
        StatError::Fit(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Display messages embed their payloads.
    // - Wrapped errors keep the inner message.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The degrees-of-freedom error names both counts.
    //
    // Given
    // -----
    // - 3 used bins against 4 free parameters.
    //
    // Expect
    // ------
    // - The message contains "3 used bins" and "4 free".
    fn dof_message_embeds_counts() {
        // Arrange
        let err = StatError::InvalidDegreesOfFreedom { used_bins: 3, n_free: 4 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("3 used bins") && msg.contains("4 free"), "message was: {msg}");
    }

    #[test]
    fn wrapped_model_error_keeps_inner_message() {
        let err: StatError = ModelError::MissingParameter { name: "n_sig".to_string() }.into();
        assert!(err.to_string().contains("n_sig"));
    }
}
