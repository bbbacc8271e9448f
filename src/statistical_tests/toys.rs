//! statistical_tests::toys — toy-based discovery significance.
//!
//! Purpose
//! -------
//! Replace the asymptotic distribution of `q₀` by empirical ones: datasets
//! are sampled from the fitted background-only (null) and
//! signal+background (alternative) hypotheses, both hypotheses are refitted
//! on every toy, and the observed `q₀` is compared with the null ensemble.
//!
//! Key behaviors
//! -------------
//! - Toy sizes are Poisson(ν̂) for extendable models and the observed
//!   dataset size otherwise.
//! - Every toy owns a `StdRng` seeded from [`ToyOptions::seed`]: null toy
//!   `i` uses `seed + i`, alternative toy `i` uses `seed + n_null + i`
//!   (wrapping). Results therefore do not depend on scheduling, and toys run
//!   in parallel with rayon.
//! - `p = #{null q₀ ≥ q₀_obs} / #kept null toys`, `Z = Φ⁻¹(1 − p)` floored
//!   at zero, `Z = +∞` when no null toy reaches the observed value.
//!
//! Invariants & assumptions
//! ------------------------
//! - Toys whose sampling or fits fail are counted in
//!   [`ToyEnsemble::n_error`] and never enter the distribution.
//! - Toys with a non-converged fit are counted in
//!   [`ToyEnsemble::n_nonconverged`]; they are kept unless
//!   [`ToyOptions::keep_nonconverged`] is `false`.
//!
//! Testing notes
//! -------------
//! - Unit tests check seed reproducibility, bookkeeping of kept and
//!   discarded toys, the empirical p-value rules, and that a strong signal
//!   exceeds every null toy.
use crate::{
    explorer::workspace::{ModelBundle, StatModel, extract},
    optimization::loglik_optimizer::MLEOptions,
    spectrum::{dataset::Dataset, model::SpectrumModel, params::ParameterSet},
    statistical_tests::{
        errors::{StatError, StatResult},
        significance::{Hypotheses, SignificanceOutcome, standard_normal},
        validation::validate_toy_counts,
    },
};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use statrs::distribution::ContinuousCDF;

/// Toy ensemble configuration.
///
/// - `n_null`: background-only toys (at least one).
/// - `n_alt`: signal+background toys (may be zero).
/// - `seed`: base seed of the per-toy random streams.
/// - `keep_nonconverged`: keep toys whose fits did not converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToyOptions {
    pub n_null: usize,
    pub n_alt: usize,
    pub seed: u64,
    pub keep_nonconverged: bool,
}

impl ToyOptions {
    /// # Errors
    /// [`StatError::InvalidToyCount`] for `n_null == 0`.
    pub fn new(
        n_null: usize, n_alt: usize, seed: u64, keep_nonconverged: bool,
    ) -> StatResult<Self> {
        validate_toy_counts(n_null)?;
        Ok(Self { n_null, n_alt, seed, keep_nonconverged })
    }
}

impl Default for ToyOptions {
    fn default() -> Self {
        Self { n_null: 1000, n_alt: 1000, seed: 0, keep_nonconverged: true }
    }
}

/// Empirical `q₀` distribution of one hypothesis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToyEnsemble {
    /// Kept `q₀` values, in toy order.
    pub q0: Vec<f64>,
    /// Toys that failed to sample or fit.
    pub n_error: usize,
    /// Toys with at least one non-converged fit (kept or not).
    pub n_nonconverged: usize,
    /// Non-converged toys left out of `q0`.
    pub n_discarded: usize,
}

impl ToyEnsemble {
    /// Fraction of kept toys with `q₀ ≥ q0_obs`.
    ///
    /// # Errors
    /// [`StatError::EmptyToyEnsemble`] when no toy was kept.
    pub fn tail_fraction(&self, q0_obs: f64) -> StatResult<f64> {
        if self.q0.is_empty() {
            return Err(StatError::EmptyToyEnsemble);
        }
        let n_above = self.q0.iter().filter(|&&q| q >= q0_obs).count();
        Ok(n_above as f64 / self.q0.len() as f64)
    }
}

/// Result of [`toy_significance`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToySignificance {
    pub observed: SignificanceOutcome,
    pub null: ToyEnsemble,
    pub alt: ToyEnsemble,
    pub p_value: f64,
    pub z: f64,
}

/// Toy-based significance of the signal in `bundle`.
///
/// # Errors
/// - [`StatError::InvalidToyCount`] for `n_null == 0`.
/// - Failures of the fits on the observed data (as
///   [`asymptotic_significance`](super::significance::asymptotic_significance)).
/// - [`StatError::EmptyToyEnsemble`] when every null toy failed or was
///   discarded.
pub fn toy_significance<M: SpectrumModel>(
    bundle: &ModelBundle<M>, toys: &ToyOptions, opts: &MLEOptions,
) -> StatResult<ToySignificance> {
    validate_toy_counts(toys.n_null)?;
    let (data, sb, b) = extract(bundle)?;
    let hypotheses = Hypotheses::new(&sb, &b)?;
    let (observed, fit_b, fit_sb) = hypotheses.test(&data, opts)?;

    let null_gen = generator(&b, fit_b.parameters);
    let alt_gen = generator(&sb, fit_sb.parameters);
    let ctx = ToyContext { hypotheses: &hypotheses, n_observed: data.len(), opts };
    let null = ctx.ensemble(&null_gen, toys.seed, toys.n_null, toys.keep_nonconverged);
    let alt_seed = toys.seed.wrapping_add(toys.n_null as u64);
    let alt = ctx.ensemble(&alt_gen, alt_seed, toys.n_alt, toys.keep_nonconverged);

    let p_value = null.tail_fraction(observed.q0())?;
    let z = z_from_p(p_value)?;
    Ok(ToySignificance { observed, null, alt, p_value, z })
}

/// One-sided significance of an empirical p-value.
///
/// # Errors
/// [`StatError::Distribution`] if the normal quantile is unavailable.
pub fn z_from_p(p: f64) -> StatResult<f64> {
    if p <= 0.0 {
        return Ok(f64::INFINITY);
    }
    let z = standard_normal()?.inverse_cdf(1.0 - p);
    Ok(if z > 0.0 { z } else { 0.0 })
}

// ---- Helper methods ----

fn generator<M: SpectrumModel>(hypothesis: &StatModel<M>, fitted: ParameterSet) -> M {
    let mut model = hypothesis.model.clone();
    *model.parameters_mut() = fitted;
    model
}

/// Outcome of a single toy: `q₀` and whether both fits converged.
type ToyRun = StatResult<(f64, bool)>;

struct ToyContext<'a, M: SpectrumModel> {
    hypotheses: &'a Hypotheses<'a, M>,
    n_observed: usize,
    opts: &'a MLEOptions,
}

impl<M: SpectrumModel> ToyContext<'_, M> {
    fn ensemble(
        &self, gen_model: &M, seed: u64, n_toys: usize, keep_nonconverged: bool,
    ) -> ToyEnsemble {
        let runs: Vec<ToyRun> = (0..n_toys)
            .into_par_iter()
            .map(|i| self.run_toy(gen_model, seed.wrapping_add(i as u64)))
            .collect();
        let mut ensemble = ToyEnsemble::default();
        for run in runs {
            match run {
                Err(_) => ensemble.n_error += 1,
                Ok((q0, true)) => ensemble.q0.push(q0),
                Ok((q0, false)) => {
                    ensemble.n_nonconverged += 1;
                    if keep_nonconverged {
                        ensemble.q0.push(q0);
                    } else {
                        ensemble.n_discarded += 1;
                    }
                }
            }
        }
        ensemble
    }

    fn run_toy(&self, gen_model: &M, seed: u64) -> ToyRun {
        let mut rng = StdRng::seed_from_u64(seed);
        let toy = sample_toy(gen_model, self.n_observed, &mut rng)?;
        let (outcome, _, _) = self.hypotheses.test(&toy, self.opts)?;
        Ok((outcome.q0(), outcome.converged()))
    }
}

/// Draw one toy dataset of Poisson(ν̂) events (extendable models) or of the
/// observed size.
fn sample_toy<M: SpectrumModel>(
    model: &M, n_observed: usize, rng: &mut StdRng,
) -> StatResult<Dataset> {
    let n = if model.is_extendable() {
        let nu = model.expected_events(&model.parameters().values())?;
        if nu > 0.0 {
            let dist = Poisson::new(nu).map_err(|e| StatError::Distribution(e.to_string()))?;
            dist.sample(rng) as usize
        } else {
            0
        }
    } else {
        n_observed
    };
    Ok(model.sample(n, rng)?)
}
