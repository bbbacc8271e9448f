//! explorer::results — records produced by the fit protocols.
//!
//! [`FitResult`] is the immutable record of a likelihood fit (values,
//! errors, covariance, status); [`Chi2FitOutcome`] is the lighter record of
//! a χ² fit; [`PassReport`] describes one optimizer pass of either protocol.
use crate::{
    explorer::errors::ExplorerResult,
    spectrum::params::{Parameter, ParameterSet},
};
use ndarray::Array2;

/// Outcome of one optimizer pass.
///
/// `status` follows the optimizer codes: 0 converged, 1 iteration limit,
/// 2 failure (start values kept), 3 not terminated. `value` is the
/// minimized statistic (NLL or χ²) at the end of the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub pass: usize,
    pub n_free: usize,
    pub status: i32,
    pub iterations: usize,
    pub value: f64,
    /// Optimizer termination text, or the error that aborted the pass.
    pub message: String,
}

impl PassReport {
    pub fn converged(&self) -> bool {
        self.status == 0
    }
}

/// Non-fatal conditions attached to a fit.
#[derive(Debug, Clone, PartialEq)]
pub enum FitWarning {
    /// Weighted-data correction applied: the errors of the last two passes
    /// may differ and only the saved result is authoritative.
    SumW2ErrorsDiffer,
    /// The curvature matrix had flat or negative directions.
    CovarianceNotPositiveDefinite { dropped: usize },
    /// A floating parameter ended within tolerance of one of its limits.
    ParameterAtLimit { name: String },
    /// The final pass did not converge.
    NotConverged { status: i32 },
}

impl std::fmt::Display for FitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitWarning::SumW2ErrorsDiffer => write!(
                f,
                "BEWARE: errors of the last two fits might differ with sum-of-weights \
                 correction; trust the saved result"
            ),
            FitWarning::CovarianceNotPositiveDefinite { dropped } => {
                write!(f, "Covariance is not positive definite ({dropped} directions dropped)")
            }
            FitWarning::ParameterAtLimit { name } => {
                write!(f, "Parameter '{name}' is at a limit")
            }
            FitWarning::NotConverged { status } => {
                write!(f, "Final fit pass did not converge (status {status})")
            }
        }
    }
}

/// FitResult — record of a completed likelihood fit.
///
/// Fields
/// ------
/// - `parameters`: full parameter set at the fitted values; floating
///   parameters carry symmetric errors.
/// - `floating`: names of the floating parameters, in covariance order.
/// - `covariance` / `correlation`: matrices over `floating`, absent when the
///   curvature could not be inverted.
/// - `min_nll`: NLL at the minimum; `edm`: `½ gᵀVg` there.
/// - `passes`: reports of the four protocol passes.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    status: i32,
    parameters: ParameterSet,
    floating: Vec<String>,
    covariance: Option<Array2<f64>>,
    correlation: Option<Array2<f64>>,
    min_nll: f64,
    edm: f64,
    sum_w2: bool,
    passes: Vec<PassReport>,
    warnings: Vec<FitWarning>,
}

impl FitResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        status: i32, parameters: ParameterSet, floating: Vec<String>,
        covariance: Option<Array2<f64>>, correlation: Option<Array2<f64>>, min_nll: f64,
        edm: f64, sum_w2: bool, passes: Vec<PassReport>, warnings: Vec<FitWarning>,
    ) -> Self {
        Self {
            status,
            parameters,
            floating,
            covariance,
            correlation,
            min_nll,
            edm,
            sum_w2,
            passes,
            warnings,
        }
    }

    /// Status code of the final pass.
    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn converged(&self) -> bool {
        self.status == 0
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Fitted parameter by name.
    ///
    /// # Errors
    /// `ExplorerError::MissingParameter` for unknown names.
    pub fn parameter(&self, name: &str) -> ExplorerResult<&Parameter> {
        Ok(self.parameters.get(name)?)
    }

    pub fn value(&self, name: &str) -> ExplorerResult<f64> {
        Ok(self.parameter(name)?.value)
    }

    /// Symmetric error of `name`; `None` for constant parameters.
    pub fn error(&self, name: &str) -> ExplorerResult<Option<f64>> {
        Ok(self.parameter(name)?.error)
    }

    pub fn floating(&self) -> &[String] {
        &self.floating
    }

    pub fn covariance(&self) -> Option<&Array2<f64>> {
        self.covariance.as_ref()
    }

    pub fn correlation(&self) -> Option<&Array2<f64>> {
        self.correlation.as_ref()
    }

    pub fn min_nll(&self) -> f64 {
        self.min_nll
    }

    pub fn edm(&self) -> f64 {
        self.edm
    }

    /// `true` when the covariance carries the weighted-data correction.
    pub fn is_sum_w2(&self) -> bool {
        self.sum_w2
    }

    pub fn passes(&self) -> &[PassReport] {
        &self.passes
    }

    pub fn warnings(&self) -> &[FitWarning] {
        &self.warnings
    }

    /// Copy fitted values and errors into `target`, matching by name.
    ///
    /// # Errors
    /// `ExplorerError::MissingParameter` if `target` lacks a fitted name;
    /// `ExplorerError::Model` if a value violates `target`'s bounds.
    pub fn apply_to(&self, target: &mut ParameterSet) -> ExplorerResult<()> {
        apply_parameters(&self.parameters, target)
    }
}

/// Asymmetric profile-likelihood interval of one parameter.
///
/// `lower` is negative and `upper` positive, both relative to `value`.
/// An `*_at_limit` flag means the scan stopped at the parameter bound before
/// the cost rose by `up`, so that side is a bound, not an interval edge.
#[derive(Debug, Clone, PartialEq)]
pub struct MinosError {
    pub parameter: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub lower_at_limit: bool,
    pub upper_at_limit: bool,
}

impl MinosError {
    pub fn is_valid(&self) -> bool {
        !self.lower_at_limit && !self.upper_at_limit
    }
}

/// Chi2FitOutcome — record of a binned χ² fit.
///
/// Carries the pass reports, the fitted parameters with parabolic errors,
/// the final χ² and the number of bins that entered it, and the optional
/// MINOS interval. No covariance matrix is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Chi2FitOutcome {
    pub status: i32,
    pub parameters: ParameterSet,
    pub chi2: f64,
    pub used_bins: usize,
    pub passes: Vec<PassReport>,
    pub minos: Option<MinosError>,
}

impl Chi2FitOutcome {
    pub fn converged(&self) -> bool {
        self.status == 0
    }

    /// Number of floating parameters of the final pass.
    pub fn n_free(&self) -> usize {
        self.parameters.n_free()
    }

    /// Copy fitted values and errors into `target`, matching by name.
    ///
    /// # Errors
    /// As [`FitResult::apply_to`].
    pub fn apply_to(&self, target: &mut ParameterSet) -> ExplorerResult<()> {
        apply_parameters(&self.parameters, target)
    }
}

fn apply_parameters(source: &ParameterSet, target: &mut ParameterSet) -> ExplorerResult<()> {
    for p in source.iter() {
        let dst = target.get_mut(&p.name)?;
        dst.set_value(p.value)?;
        dst.error = p.error;
        dst.asym_error = p.asym_error;
    }
    Ok(())
}
