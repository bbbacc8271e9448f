//! statistical_tests::significance — asymptotic discovery significance.
//!
//! Purpose
//! -------
//! Compare the background-only and signal+background hypotheses of a
//! [`ModelBundle`] with the profile-likelihood-ratio statistic
//!
//! `q₀ = 2·(NLL_b − NLL_sb)`,
//!
//! and convert it to a one-sided significance with Wilks' theorem,
//! `Z = √q₀`, `p = 1 − Φ(Z)`.
//!
//! Key behaviors
//! -------------
//! - The background-only fit holds the signal yield constant at zero; the
//!   signal+background fit floats it. Both start from the bundle's fitted
//!   values and minimize the (extended) unbinned NLL.
//! - `q₀` is set to exactly zero when the fitted signal yield is not
//!   positive (one-sided test) or the NLL difference is within round-off,
//!   so `Z` is never negative or imaginary and a background-like best fit
//!   gives `Z = 0`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The first POI of the bundle is the signal yield and zero is inside
//!   its bounds.
//! - Non-converged hypothesis fits are not errors; their status codes are
//!   reported on [`SignificanceOutcome`].
use crate::{
    explorer::{
        fit::{NllMinimum, minimize_nll},
        workspace::{ModelBundle, StatModel, extract},
    },
    optimization::loglik_optimizer::MLEOptions,
    spectrum::{dataset::Dataset, model::SpectrumModel},
    statistical_tests::errors::{StatError, StatResult},
};
use statrs::distribution::{ContinuousCDF, Normal};

/// SignificanceOutcome — asymptotic test of the background-only hypothesis.
///
/// Fields
/// ------
/// - `q0`: clipped profile-likelihood-ratio statistic (≥ 0).
/// - `z`: `√q₀`.
/// - `p_value`: one-sided `1 − Φ(z)`.
/// - `mu_hat`: fitted signal yield of the signal+background hypothesis.
/// - `nll_b`, `nll_sb`: minimized NLLs of both hypotheses.
/// - `status_b`, `status_sb`: optimizer status codes of both fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignificanceOutcome {
    q0: f64,
    z: f64,
    p_value: f64,
    mu_hat: f64,
    nll_b: f64,
    nll_sb: f64,
    status_b: i32,
    status_sb: i32,
}

impl SignificanceOutcome {
    pub fn q0(&self) -> f64 {
        self.q0
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    pub fn mu_hat(&self) -> f64 {
        self.mu_hat
    }

    pub fn nll_b(&self) -> f64 {
        self.nll_b
    }

    pub fn nll_sb(&self) -> f64 {
        self.nll_sb
    }

    pub fn status_b(&self) -> i32 {
        self.status_b
    }

    pub fn status_sb(&self) -> i32 {
        self.status_sb
    }

    /// `true` when both hypothesis fits converged.
    pub fn converged(&self) -> bool {
        self.status_b == 0 && self.status_sb == 0
    }
}

/// Round-off allowance of `q₀`, in units of `ε·max(|NLL_b|, 1)`.
const Q0_ROUNDOFF_ULPS: f64 = 16.0;

/// One-sided `q₀` from the two minimized NLLs.
///
/// Returns exactly zero when the fitted signal is not positive, and when
/// `2·(NLL_b − NLL_sb)` does not exceed the round-off of the NLL sums.
pub fn q0_from_fits(nll_b: f64, nll_sb: f64, mu_hat: f64) -> f64 {
    if mu_hat <= 0.0 {
        return 0.0;
    }
    let q0 = 2.0 * (nll_b - nll_sb);
    let roundoff = Q0_ROUNDOFF_ULPS * f64::EPSILON * nll_b.abs().max(1.0);
    if q0 > roundoff { q0 } else { 0.0 }
}

/// Asymptotic significance of the signal in `bundle`.
///
/// # Errors
/// - [`StatError::Model`] if zero is outside the POI bounds or a model
///   cannot be evaluated.
/// - [`StatError::Fit`] for failures of the hypothesis fits.
pub fn asymptotic_significance<M: SpectrumModel>(
    bundle: &ModelBundle<M>, opts: &MLEOptions,
) -> StatResult<SignificanceOutcome> {
    let (data, sb, b) = extract(bundle)?;
    let hypotheses = Hypotheses::new(&sb, &b)?;
    Ok(hypotheses.test(&data, opts)?.0)
}

/// Background-only and signal+background models with their start points.
pub(crate) struct Hypotheses<'a, M: SpectrumModel> {
    pub sb: &'a StatModel<M>,
    pub b: &'a StatModel<M>,
    poi: String,
}

impl<'a, M: SpectrumModel> Hypotheses<'a, M> {
    pub(crate) fn new(sb: &'a StatModel<M>, b: &'a StatModel<M>) -> StatResult<Self> {
        let poi = sb.config.primary_poi().to_string();
        b.model.parameters().index_of(&poi)?;
        Ok(Self { sb, b, poi })
    }

    /// Fit both hypotheses to `data` and build the outcome; also returns the
    /// two minima (background-only first).
    pub(crate) fn test(
        &self, data: &Dataset, opts: &MLEOptions,
    ) -> StatResult<(SignificanceOutcome, NllMinimum, NllMinimum)> {
        let mut start_b = self.b.model.parameters().clone();
        start_b.set_value(&self.poi, 0.0)?;
        start_b.set_constant(&self.poi, true)?;
        let mut start_sb = self.sb.model.parameters().clone();
        start_sb.set_constant(&self.poi, false)?;

        let fit_b = minimize_nll(&self.b.model, &start_b, data, opts)?;
        let fit_sb = minimize_nll(&self.sb.model, &start_sb, data, opts)?;
        let mu_hat = fit_sb.parameters.value(&self.poi)?;
        let outcome = outcome_from_fits(&fit_b, &fit_sb, mu_hat)?;
        Ok((outcome, fit_b, fit_sb))
    }
}

// ---- Helper methods ----

fn outcome_from_fits(
    fit_b: &NllMinimum, fit_sb: &NllMinimum, mu_hat: f64,
) -> StatResult<SignificanceOutcome> {
    let q0 = q0_from_fits(fit_b.nll, fit_sb.nll, mu_hat);
    let z = q0.sqrt();
    Ok(SignificanceOutcome {
        q0,
        z,
        p_value: upper_tail(z)?,
        mu_hat,
        nll_b: fit_b.nll,
        nll_sb: fit_sb.nll,
        status_b: fit_b.status,
        status_sb: fit_sb.status,
    })
}

/// `1 − Φ(z)` of the standard normal.
pub(crate) fn upper_tail(z: f64) -> StatResult<f64> {
    let normal = standard_normal()?;
    Ok((1.0 - normal.cdf(z)).clamp(0.0, 1.0))
}

pub(crate) fn standard_normal() -> StatResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| StatError::Distribution(e.to_string()))
}
