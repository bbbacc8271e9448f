//! statistical_tests::chi_square — binned χ² statistic and goodness-of-fit test.
//!
//! Purpose
//! -------
//! Compare a binned dataset with the bin expectations of a spectrum model.
//! The same statistic drives the binned χ² fit (`explorer::fit`) and the
//! goodness-of-fit test [`chi_square_test`].
//!
//! Key behaviors
//! -------------
//! - [`ChiSquareData`] freezes a histogram together with the per-bin error
//!   inputs required by its [`BinErrors`] policy.
//! - [`ChiSquareData::statistic`] returns `Σ (nᵢ − μᵢ)² / σᵢ²` and the number
//!   of bins that entered the sum.
//! - [`chi_square_test`] turns the statistic into `ndf = used − n_free` and
//!   the upper-tail χ²(ndf) p-value, and flags pass/fail against `alpha`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Expected counts are `ν·∫bin f` for extended models and `N·∫bin f` for
//!   non-extended ones, where `N` is the histogram's sum of weights.
//! - Bins whose variance is zero under the chosen policy are skipped and
//!   are not counted as used.
//!
//! Conventions
//! -----------
//! - `Poisson` errors are the Garwood 68.27 % interval of the observed
//!   count: the upper error applies when `μ > n`, the lower one otherwise.
//! - `SumW2` uses the bin's `Σw²`; `Expected` (Pearson) uses `μ`.
//! - `Auto` resolves to `SumW2` for weighted histograms and `Poisson`
//!   otherwise.
//!
//! Testing notes
//! -------------
//! - Unit tests pin Garwood intervals against tabulated values, check each
//!   error policy on a hand-computed histogram, and cover the ndf guard.
//! - The integration suite checks p-value calibration on sampled data.
use crate::{
    spectrum::{
        dataset::Dataset,
        errors::{ModelError, ModelResult},
        histogram::Histogram,
        model::SpectrumModel,
    },
    statistical_tests::{
        errors::{StatError, StatResult},
        validation::{validate_alpha, validate_bins},
    },
};
use ndarray::Array1;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// `1 − 0.6827`: two-sided coverage complement of a ±1σ interval.
pub const GARWOOD_ALPHA: f64 = 0.31731;

/// Per-bin error model for the χ² statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinErrors {
    /// `SumW2` for weighted data, `Poisson` otherwise.
    #[default]
    Auto,
    /// Garwood interval of the observed count.
    Poisson,
    /// Sum of squared weights of the bin.
    SumW2,
    /// Model expectation (Pearson χ²).
    Expected,
}

impl BinErrors {
    /// Concrete policy for data that is (`weighted`) or is not weighted.
    pub fn resolve(self, weighted: bool) -> BinErrors {
        match self {
            BinErrors::Auto if weighted => BinErrors::SumW2,
            BinErrors::Auto => BinErrors::Poisson,
            other => other,
        }
    }
}

/// Garwood 68.27 % interval half-widths `(lower, upper)` for count `n`.
///
/// # Errors
/// [`StatError::Distribution`] if a χ² quantile cannot be built (negative
/// or non-finite `n`).
pub fn garwood_interval(n: f64) -> StatResult<(f64, f64)> {
    if !n.is_finite() || n < 0.0 {
        return Err(StatError::Distribution(format!("Garwood interval needs n ≥ 0, got {n}")));
    }
    let lower = if n == 0.0 {
        0.0
    } else {
        let dist = ChiSquared::new(2.0 * n).map_err(|e| StatError::Distribution(e.to_string()))?;
        n - 0.5 * dist.inverse_cdf(GARWOOD_ALPHA / 2.0)
    };
    let dist_hi =
        ChiSquared::new(2.0 * (n + 1.0)).map_err(|e| StatError::Distribution(e.to_string()))?;
    let upper = 0.5 * dist_hi.inverse_cdf(1.0 - GARWOOD_ALPHA / 2.0) - n;
    Ok((lower, upper))
}

/// Binned data prepared for χ² evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareData {
    edges: Array1<f64>,
    counts: Array1<f64>,
    sumw2: Array1<f64>,
    err_lo: Array1<f64>,
    err_hi: Array1<f64>,
    errors: BinErrors,
    total: f64,
}

impl ChiSquareData {
    /// Freeze `hist` under the error policy `errors` (after resolving `Auto`).
    ///
    /// # Errors
    /// [`StatError::Distribution`] when Garwood intervals cannot be built.
    pub fn from_histogram(hist: &Histogram, errors: BinErrors) -> StatResult<Self> {
        let errors = errors.resolve(hist.is_weighted());
        let n_bins = hist.bins();
        let mut err_lo = Array1::zeros(n_bins);
        let mut err_hi = Array1::zeros(n_bins);
        if errors == BinErrors::Poisson {
            for (b, &n) in hist.counts().iter().enumerate() {
                let (lo, hi) = garwood_interval(n.max(0.0))?;
                err_lo[b] = lo;
                err_hi[b] = hi;
            }
        }
        Ok(Self {
            edges: hist.edges(),
            counts: hist.counts().clone(),
            sumw2: hist.sumw2().clone(),
            err_lo,
            err_hi,
            errors,
            total: hist.total(),
        })
    }

    /// Bin `data` into `bins` bins over its observable range.
    ///
    /// # Errors
    /// [`StatError::Model`] for `bins == 0`, otherwise as
    /// [`ChiSquareData::from_histogram`].
    pub fn from_dataset(data: &Dataset, bins: usize, errors: BinErrors) -> StatResult<Self> {
        let hist = data.to_histogram(bins)?;
        ChiSquareData::from_histogram(&hist, errors)
    }

    pub fn edges(&self) -> &Array1<f64> {
        &self.edges
    }

    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Resolved error policy (never `Auto`).
    pub fn errors(&self) -> BinErrors {
        self.errors
    }

    /// Sum of weights over all bins.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Expected content of every bin for parameter values `values`.
    ///
    /// # Errors
    /// Propagates model evaluation failures; [`ModelError::InvalidBins`] if
    /// the model returns the wrong number of integrals.
    pub fn expected<M: SpectrumModel>(
        &self, model: &M, values: &Array1<f64>,
    ) -> ModelResult<Array1<f64>> {
        let integrals = model.bin_integrals(&self.edges, values)?;
        if integrals.len() != self.bins() {
            return Err(ModelError::InvalidBins { bins: integrals.len() });
        }
        let norm =
            if model.is_extendable() { model.expected_events(values)? } else { self.total };
        Ok(integrals * norm)
    }

    /// Variance of bin `b` given its expectation `mu`.
    pub fn variance(&self, b: usize, mu: f64) -> f64 {
        match self.errors {
            BinErrors::Poisson | BinErrors::Auto => {
                let err = if mu > self.counts[b] { self.err_hi[b] } else { self.err_lo[b] };
                err * err
            }
            BinErrors::SumW2 => self.sumw2[b],
            BinErrors::Expected => mu.max(0.0),
        }
    }

    /// `(χ², used_bins)` for parameter values `values`.
    ///
    /// # Errors
    /// Propagates [`ChiSquareData::expected`] failures.
    pub fn statistic<M: SpectrumModel>(
        &self, model: &M, values: &Array1<f64>,
    ) -> ModelResult<(f64, usize)> {
        let mu = self.expected(model, values)?;
        let mut chi2 = 0.0;
        let mut used = 0;
        for (b, (&n, &m)) in self.counts.iter().zip(mu.iter()).enumerate() {
            let var = self.variance(b, m);
            if !(var > 0.0) {
                continue;
            }
            chi2 += (n - m) * (n - m) / var;
            used += 1;
        }
        Ok((chi2, used))
    }
}

/// Chi2TestOutcome — result of a binned goodness-of-fit test.
///
/// Fields
/// ------
/// - `statistic`: χ² summed over used bins.
/// - `ndf`: `used_bins − n_free`, always positive.
/// - `p_value`: upper-tail χ²(ndf) probability of `statistic`.
/// - `used_bins`: bins with non-zero variance.
/// - `passed`: `p_value ≥ alpha`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Chi2TestOutcome {
    statistic: f64,
    ndf: usize,
    p_value: f64,
    used_bins: usize,
    passed: bool,
}

impl Chi2TestOutcome {
    /// Build the outcome from a statistic and its bookkeeping.
    ///
    /// # Errors
    /// - [`StatError::InvalidDegreesOfFreedom`] when `used_bins ≤ n_free`.
    /// - [`StatError::InvalidThreshold`] for `alpha ∉ (0, 1)`.
    /// - [`StatError::NonFiniteStatistic`] for a NaN/∞ statistic.
    pub fn from_statistic(
        statistic: f64, used_bins: usize, n_free: usize, alpha: f64,
    ) -> StatResult<Self> {
        validate_alpha(alpha)?;
        if !statistic.is_finite() {
            return Err(StatError::NonFiniteStatistic(statistic));
        }
        if used_bins <= n_free {
            return Err(StatError::InvalidDegreesOfFreedom { used_bins, n_free });
        }
        let ndf = used_bins - n_free;
        let dist =
            ChiSquared::new(ndf as f64).map_err(|e| StatError::Distribution(e.to_string()))?;
        let p_value = (1.0 - dist.cdf(statistic)).clamp(0.0, 1.0);
        Ok(Self { statistic, ndf, p_value, used_bins, passed: p_value >= alpha })
    }

    pub fn statistic(&self) -> f64 {
        self.statistic
    }

    pub fn ndf(&self) -> usize {
        self.ndf
    }

    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    pub fn used_bins(&self) -> usize {
        self.used_bins
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// χ²/ndf.
    pub fn reduced(&self) -> f64 {
        self.statistic / self.ndf as f64
    }
}

/// Goodness-of-fit of `model` (at its current parameter values) to `data`.
///
/// `bins` overrides the observable's bin count; `n_free` is the number of
/// parameters the preceding fit floated.
///
/// # Errors
/// - [`StatError::InvalidBins`] for `bins == Some(0)`.
/// - Any error of [`Chi2TestOutcome::from_statistic`].
/// - [`StatError::Model`] when the model cannot be evaluated.
pub fn chi_square_test<M: SpectrumModel>(
    model: &M, data: &Dataset, bins: Option<usize>, errors: BinErrors, n_free: usize, alpha: f64,
) -> StatResult<Chi2TestOutcome> {
    validate_alpha(alpha)?;
    let bins = validate_bins(bins)?.unwrap_or(data.observable().bins());
    let binned = ChiSquareData::from_dataset(data, bins, errors)?;
    let (statistic, used_bins) = binned.statistic(model, &model.parameters().values())?;
    Chi2TestOutcome::from_statistic(statistic, used_bins, n_free, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{
        composite::{Component, CompositeModel},
        observable::Observable,
        params::{Parameter, ParameterSet},
        shapes::Shape,
    };
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Garwood intervals against tabulated values.
    // - Error-policy resolution and per-bin variances.
    // - χ² statistic of a flat model against a hand-built histogram.
    // - ndf and threshold guards of the goodness-of-fit test.
    // -------------------------------------------------------------------------

    fn flat_model(n_events: f64) -> CompositeModel {
        let obs = Observable::new("m", 0.0, 4.0, 4).unwrap();
        let params = ParameterSet::new(vec![Parameter::new("n_bkg", n_events, 0.0, 1e6).unwrap()])
            .unwrap();
        CompositeModel::extended(
            "flat",
            obs,
            params,
            vec![Component::background("bkgr", Shape::Uniform)],
            &["n_bkg"],
        )
        .unwrap()
    }

    fn histogram(counts: &[usize]) -> Histogram {
        let mut hist = Histogram::new(0.0, 4.0, counts.len()).unwrap();
        for (b, &n) in counts.iter().enumerate() {
            for _ in 0..n {
                hist.fill(b as f64 + 0.5, 1.0);
            }
        }
        hist
    }

    #[test]
    // Purpose
    // -------
    // Garwood half-widths match the standard 68.27 % Poisson table.
    //
    // Given
    // -----
    // - n = 0, 1, 4.
    //
    // Expect
    // ------
    // - (0, 1.841), (0.827, 2.300), (1.914, 3.162) to 1e-2.
    fn garwood_matches_tabulated_intervals() {
        let cases = [(0.0, 0.0, 1.841), (1.0, 0.827, 2.300), (4.0, 1.914, 3.162)];
        for (n, lo, hi) in cases {
            // Act
            let (l, h) = garwood_interval(n).unwrap();

            // Assert
            assert_abs_diff_eq!(l, lo, epsilon = 1e-2);
            assert_abs_diff_eq!(h, hi, epsilon = 1e-2);
        }
        assert!(garwood_interval(-1.0).is_err());
    }

    #[test]
    fn auto_policy_follows_weighting() {
        assert_eq!(BinErrors::Auto.resolve(true), BinErrors::SumW2);
        assert_eq!(BinErrors::Auto.resolve(false), BinErrors::Poisson);
        assert_eq!(BinErrors::Expected.resolve(true), BinErrors::Expected);
    }

    #[test]
    // Purpose
    // -------
    // Pearson χ² of a flat extended model equals the textbook sum.
    //
    // Given
    // -----
    // - Four unit bins with counts (8, 12, 10, 10) and ν = 40, so μ = 10.
    //
    // Expect
    // ------
    // - χ² = (4 + 4 + 0 + 0)/10 = 0.8 over 4 used bins.
    fn pearson_statistic_matches_hand_computation() {
        // Arrange
        let model = flat_model(40.0);
        let data = ChiSquareData::from_histogram(&histogram(&[8, 12, 10, 10]), BinErrors::Expected)
            .unwrap();

        // Act
        let (chi2, used) = data.statistic(&model, &model.parameters().values()).unwrap();

        // Assert
        assert_abs_diff_eq!(chi2, 0.8, epsilon = 1e-9);
        assert_eq!(used, 4);
    }

    #[test]
    // Purpose
    // -------
    // Empty bins carry no variance under `SumW2` and are skipped.
    //
    // Given
    // -----
    // - Counts (0, 20, 10, 10), ν = 40, SumW2 errors.
    //
    // Expect
    // ------
    // - Three used bins and χ² = 100/20 + 0 + 0 = 5.
    fn zero_variance_bins_are_skipped() {
        let model = flat_model(40.0);
        let data =
            ChiSquareData::from_histogram(&histogram(&[0, 20, 10, 10]), BinErrors::SumW2).unwrap();

        let (chi2, used) = data.statistic(&model, &model.parameters().values()).unwrap();

        assert_eq!(used, 3);
        assert_abs_diff_eq!(chi2, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn poisson_policy_uses_upper_error_below_expectation() {
        let data =
            ChiSquareData::from_histogram(&histogram(&[4, 12, 12, 12]), BinErrors::Auto).unwrap();
        assert_eq!(data.errors(), BinErrors::Poisson);

        let (_, hi) = garwood_interval(4.0).unwrap();
        assert_abs_diff_eq!(data.variance(0, 10.0), hi * hi, epsilon = 1e-12);
        let (lo, _) = garwood_interval(12.0).unwrap();
        assert_abs_diff_eq!(data.variance(1, 10.0), lo * lo, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The goodness-of-fit test subtracts free parameters from used bins and
    // reports the χ² upper tail.
    //
    // Given
    // -----
    // - The Pearson example above (χ² = 0.8, 4 bins) with one free parameter.
    //
    // Expect
    // ------
    // - ndf = 3, p = 1 − F₃(0.8) ≈ 0.8495, passed at α = 0.05.
    fn outcome_reports_ndf_and_upper_tail() {
        // Act
        let out = Chi2TestOutcome::from_statistic(0.8, 4, 1, 0.05).unwrap();

        // Assert
        assert_eq!(out.ndf(), 3);
        assert_abs_diff_eq!(out.p_value(), 0.8495, epsilon = 1e-3);
        assert!(out.passed());
        assert_abs_diff_eq!(out.reduced(), 0.8 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn non_positive_ndf_and_bad_alpha_are_rejected() {
        assert!(matches!(
            Chi2TestOutcome::from_statistic(1.0, 3, 3, 0.05),
            Err(StatError::InvalidDegreesOfFreedom { used_bins: 3, n_free: 3 })
        ));
        assert!(matches!(
            Chi2TestOutcome::from_statistic(1.0, 5, 1, 1.0),
            Err(StatError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_rejects_zero_bin_override() {
        let model = flat_model(40.0);
        let data =
            Dataset::new(model.observable().clone(), Array1::from(vec![0.5, 1.5, 2.5])).unwrap();
        let err = chi_square_test(&model, &data, Some(0), BinErrors::Expected, 0, 0.05);
        assert!(matches!(err, Err(StatError::InvalidBins(0))));
    }
}
