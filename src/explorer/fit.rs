//! explorer::fit — staged likelihood and χ² fit protocols.
//!
//! Purpose
//! -------
//! Drive the optimizer through the four-pass protocol shared by both fit
//! modes and assemble the result records:
//!
//! 1. all floating parameters free,
//! 2. the caller's `fix` subset held constant,
//! 3. the same subset released again (recovery pass),
//! 4. final pass, whose minimum is kept.
//!
//! Fixing and releasing the same names in passes 2 and 3 is deliberate: it
//! moves the start of pass 3 away from a poor unconstrained solution.
//!
//! Key behaviors
//! -------------
//! - [`fit_likelihood`] minimizes the (extended) unbinned NLL and saves the
//!   covariance of the final pass from a finite-difference Hessian, with the
//!   weighted-data sandwich `V·C·V` when `is_sum_w2` is set.
//! - [`fit_chi2`] minimizes the binned χ², reports parabolic errors, and can
//!   run a MINOS scan for one parameter.
//! - [`minimize_nll`] is the single-minimum entry used by the significance
//!   routines.
//! - All entry points are pure: they return new parameter values and never
//!   touch the model they are given.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every name in `fix` must exist in the model; checked before any pass.
//! - A failing optimizer run is retried once with the other line search; if
//!   that also fails the pass reports status 2 and keeps its start values.
//! - A pass that starts at a stationary point reports status 0 with zero
//!   iterations.
//!
//! Testing notes
//! -------------
//! - Unit tests fit seeded Gaussian samples (mean error `σ/√N`), compare the
//!   χ² and likelihood protocols, check MINOS symmetry on a parabolic
//!   profile, and cover the missing-parameter and stationary-start paths.
use crate::{
    explorer::{
        errors::ExplorerResult,
        minos::minos_interval,
        objective::{BinnedChi2, FitObjective, FitProblem, UnbinnedNll},
        options::MinosOptions,
        results::{Chi2FitOutcome, FitResult, FitWarning, PassReport},
    },
    inference::{
        errors::InferenceError,
        hessian::{correlation, edm, observed_covariance, sandwich, standard_errors},
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            LineSearcher, MLEOptions, Theta,
            finite_diff::{central_gradient, compute_hessian, tune_steps},
            maximize,
        },
    },
    spectrum::{
        dataset::Dataset, errors::ModelError, model::SpectrumModel, params::ParameterSet,
    },
    statistical_tests::chi_square::{BinErrors, ChiSquareData},
};
use ndarray::{Array1, Array2};

/// Number of passes of the fit protocol.
pub const FIT_PASSES: usize = 4;

/// Relative distance to a limit below which a parameter is flagged.
pub const AT_LIMIT_TOL: f64 = 1e-3;

/// Initial finite-difference step as a fraction of a parameter's scale.
const STEP_FRACTION: f64 = 1e-2;

/// Minimum of one pass: full parameter values, cost (−ℓ), and its report.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PassOutcome {
    pub values: Array1<f64>,
    pub cost: f64,
    pub report: PassReport,
}

/// Result of [`minimize_nll`].
#[derive(Debug, Clone, PartialEq)]
pub struct NllMinimum {
    pub parameters: ParameterSet,
    pub nll: f64,
    pub status: i32,
}

/// Likelihood fit of `model` to `data` with the four-pass protocol.
///
/// The fit is extended when the model is extendable. With `is_sum_w2` the
/// covariance is corrected for event weights and the result carries
/// [`FitWarning::SumW2ErrorsDiffer`].
///
/// # Errors
/// - [`ExplorerError::MissingParameter`](super::ExplorerError::MissingParameter)
///   for unknown names in `fix`.
/// - [`ExplorerError::Model`](super::ExplorerError::Model) for an empty
///   dataset or a model that cannot be evaluated at its start values.
/// - [`ExplorerError::Optimizer`](super::ExplorerError::Optimizer) /
///   [`ExplorerError::Inference`](super::ExplorerError::Inference) when the
///   covariance cannot be computed.
pub fn fit_likelihood<M: SpectrumModel>(
    model: &M, data: &Dataset, fix: &[&str], is_sum_w2: bool, opts: &MLEOptions,
) -> ExplorerResult<FitResult> {
    if data.is_empty() {
        return Err(ModelError::EmptyDataset.into());
    }
    let (mut params, passes, min_nll) =
        run_protocol(model.parameters(), fix, data, opts, |p| UnbinnedNll::new(model, p))?;
    let problem = FitProblem::new(&params);
    let floating: Vec<String> =
        problem.free_indices().iter().map(|&i| params.at(i).name.clone()).collect();
    let status = passes.last().map_or(2, |r| r.status);
    let mut warnings = Vec::new();

    let nll = UnbinnedNll::new(model, problem.clone());
    let cost = |x: &Array1<f64>| -> OptResult<f64> { nll.nll_at(&problem.embed(x), data) };
    let (covariance, edm_value) = match free_covariance(&cost, &params, &problem, &mut warnings)?
    {
        Some(v) if is_sum_w2 => {
            let nll_w2 = UnbinnedNll::new(model, problem.clone()).with_weight_power(2);
            let cost_w2 =
                |x: &Array1<f64>| -> OptResult<f64> { nll_w2.nll_at(&problem.embed(x), data) };
            let x_hat = problem.free_values(problem.base());
            let initial = initial_steps(&params, &problem);
            let steps = tune_steps(&cost_w2, &x_hat, &initial, &problem.limits(&params))?;
            let c = compute_hessian(&cost_w2, &x_hat, &steps)?;
            let corrected = sandwich(&v, &c)?;
            let edm_value = stationarity(&cost, &x_hat, &corrected);
            (Some(corrected), edm_value)
        }
        Some(v) => {
            let edm_value = stationarity(&cost, &problem.free_values(problem.base()), &v);
            (Some(v), edm_value)
        }
        None => (None, f64::NAN),
    };
    if is_sum_w2 {
        warnings.push(FitWarning::SumW2ErrorsDiffer);
    }

    clear_errors(&mut params);
    if let Some(cov) = &covariance {
        let se = standard_errors(cov);
        for (name, &err) in floating.iter().zip(se.iter()) {
            params.get_mut(name)?.error = Some(err);
        }
    }
    for name in &floating {
        if params.get(name)?.at_limit(AT_LIMIT_TOL) {
            warnings.push(FitWarning::ParameterAtLimit { name: name.clone() });
        }
    }
    if status != 0 {
        warnings.push(FitWarning::NotConverged { status });
    }
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        for w in &warnings {
            eprintln!("{w}");
        }
    }
    let corr = covariance.as_ref().map(correlation);
    Ok(FitResult::new(
        status, params, floating, covariance, corr, min_nll, edm_value, is_sum_w2, passes, warnings,
    ))
}

/// Binned χ² fit of `model` to `data` with the four-pass protocol.
///
/// The histogram uses the observable's bin count and the `errors` policy.
/// With `minos_poi` a profile scan is run for that parameter after the last
/// pass and stored as its asymmetric error.
///
/// # Errors
/// - [`ExplorerError::MissingParameter`](super::ExplorerError::MissingParameter)
///   for unknown names in `fix` or `minos_poi`.
/// - [`ExplorerError::InvalidArgument`](super::ExplorerError::InvalidArgument)
///   if `minos_poi` is constant.
/// - [`ExplorerError::Statistics`](super::ExplorerError::Statistics) when the
///   histogram cannot be prepared.
pub fn fit_chi2<M: SpectrumModel>(
    model: &M, data: &Dataset, fix: &[&str], minos_poi: Option<&str>, errors: BinErrors,
    opts: &MLEOptions, minos_opts: &MinosOptions,
) -> ExplorerResult<Chi2FitOutcome> {
    if let Some(poi) = minos_poi {
        model.parameters().index_of(poi)?;
    }
    let binned = ChiSquareData::from_dataset(data, data.observable().bins(), errors)?;
    let (mut params, passes, _) =
        run_protocol(model.parameters(), fix, &binned, opts, |p| BinnedChi2::new(model, p))?;
    let status = passes.last().map_or(2, |r| r.status);
    let problem = FitProblem::new(&params);
    let chi = BinnedChi2::new(model, problem.clone());
    let cost = |x: &Array1<f64>| -> OptResult<f64> {
        Ok(0.5 * chi.chi2_at(&problem.embed(x), &binned)?.0)
    };

    clear_errors(&mut params);
    let mut ignored = Vec::new();
    if let Some(cov) = free_covariance(&cost, &params, &problem, &mut ignored)? {
        let se = standard_errors(&cov);
        for (&i, &err) in problem.free_indices().iter().zip(se.iter()) {
            let name = params.at(i).name.clone();
            params.get_mut(&name)?.error = Some(err);
        }
    }
    let (chi2, used_bins) = chi.chi2_at(problem.base(), &binned)?;

    let minos = match minos_poi {
        Some(poi) => {
            let interval = minos_interval(&params, poi, &binned, opts, minos_opts, |p| {
                BinnedChi2::new(model, p)
            })?;
            params.get_mut(poi)?.asym_error = Some((interval.lower, interval.upper));
            Some(interval)
        }
        None => None,
    };
    Ok(Chi2FitOutcome { status, parameters: params, chi2, used_bins, passes, minos })
}

/// Minimum of the unbinned NLL starting from `params`.
///
/// A second pass is run from the first minimum when the first did not
/// converge. Used for the hypothesis fits of the significance routines.
///
/// # Errors
/// [`ExplorerError::Model`](super::ExplorerError::Model) when the model
/// cannot be evaluated at `params`.
pub fn minimize_nll<M: SpectrumModel>(
    model: &M, params: &ParameterSet, data: &Dataset, opts: &MLEOptions,
) -> ExplorerResult<NllMinimum> {
    let mut params = params.clone();
    let mut outcome = run_pass(&UnbinnedNll::new(model, FitProblem::new(&params)), data, opts, 1)?;
    params.apply_values(&outcome.values)?;
    if !outcome.report.converged() {
        outcome = run_pass(&UnbinnedNll::new(model, FitProblem::new(&params)), data, opts, 2)?;
        params.apply_values(&outcome.values)?;
    }
    Ok(NllMinimum { parameters: params, nll: outcome.cost, status: outcome.report.status })
}

/// One optimizer pass of `objective`.
///
/// # Errors
/// Only evaluation failures at the start point; optimizer failures are
/// reported as status 2.
pub(crate) fn run_pass<L>(
    objective: &L, data: &L::Data, opts: &MLEOptions, pass: usize,
) -> ExplorerResult<PassOutcome>
where
    L: FitObjective,
{
    let problem = objective.problem();
    let n_free = problem.n_free();
    let u0 = problem.start();
    let cost = |u: &Theta| -> OptResult<f64> { Ok(-objective.value(u, data)?) };
    let cost0 = cost(&u0)?;
    let at_start = |message: &str, status: i32| PassOutcome {
        values: problem.to_full(&u0),
        cost: cost0,
        report: PassReport {
            pass,
            n_free,
            status,
            iterations: 0,
            value: objective.statistic(-cost0),
            message: message.to_string(),
        },
    };
    if n_free == 0 {
        return Ok(at_start("No floating parameters", 0));
    }
    if let (Some(tol), Ok(g)) = (opts.tols.tol_grad, central_gradient(&cost, &u0)) {
        if g.dot(&g).sqrt() < tol {
            return Ok(at_start("Start point is stationary", 0));
        }
    }

    let result = maximize(objective, u0.clone(), data, opts).or_else(|_| {
        let mut retry = opts.clone();
        retry.line_searcher = match opts.line_searcher {
            LineSearcher::MoreThuente => LineSearcher::HagerZhang,
            LineSearcher::HagerZhang => LineSearcher::MoreThuente,
        };
        maximize(objective, u0.clone(), data, &retry)
    });
    match result {
        Ok(out) => Ok(PassOutcome {
            values: problem.to_full(&out.theta_hat),
            cost: -out.value,
            report: PassReport {
                pass,
                n_free,
                status: out.status_code(),
                iterations: out.iterations,
                value: objective.statistic(out.value),
                message: out.status,
            },
        }),
        Err(err) => Ok(at_start(&err.to_string(), 2)),
    }
}

// ---- Helper methods ----

/// Four passes with `fix` held constant in pass 2 and released in pass 3.
fn run_protocol<L, B>(
    start: &ParameterSet, fix: &[&str], data: &L::Data, opts: &MLEOptions, build: B,
) -> ExplorerResult<(ParameterSet, Vec<PassReport>, f64)>
where
    L: FitObjective,
    B: Fn(FitProblem) -> L,
{
    // Only names floating at the start are released again in pass 3.
    let mut released = Vec::with_capacity(fix.len());
    for &name in fix {
        if !start.get(name)?.constant {
            released.push(name);
        }
    }
    let mut params = start.clone();
    let mut reports = Vec::with_capacity(FIT_PASSES);
    let mut cost = f64::NAN;
    for pass in 1..=FIT_PASSES {
        match pass {
            2 => set_constant_all(&mut params, &released, true)?,
            3 => set_constant_all(&mut params, &released, false)?,
            _ => {}
        }
        let outcome = run_pass(&build(FitProblem::new(&params)), data, opts, pass)?;
        params.apply_values(&outcome.values)?;
        #[cfg(feature = "obs_slog")]
        if opts.verbose {
            let r = &outcome.report;
            eprintln!(
                "pass {}: n_free = {}, status = {}, iterations = {}, value = {:.6}",
                r.pass, r.n_free, r.status, r.iterations, r.value
            );
        }
        cost = outcome.cost;
        reports.push(outcome.report);
    }
    Ok((params, reports, cost))
}

fn set_constant_all(
    params: &mut ParameterSet, names: &[&str], constant: bool,
) -> ExplorerResult<()> {
    for name in names {
        params.set_constant(name, constant)?;
    }
    Ok(())
}

fn clear_errors(params: &mut ParameterSet) {
    for p in params.iter_mut() {
        p.error = None;
        p.asym_error = None;
    }
}

/// Starting Hessian steps: previous errors when known, otherwise a fraction
/// of the range (two-sided limits) or of the value's magnitude.
fn initial_steps(params: &ParameterSet, problem: &FitProblem) -> Array1<f64> {
    Array1::from_iter(problem.free_indices().iter().map(|&i| {
        let p = params.at(i);
        match p.error {
            Some(e) if e.is_finite() && e > 0.0 => e,
            _ if p.has_lower() && p.has_upper() => STEP_FRACTION * (p.max - p.min),
            _ => STEP_FRACTION * p.value.abs().max(1.0),
        }
    }))
}

/// Covariance of the floating parameters in external coordinates, or `None`
/// with a warning when the curvature has no positive direction.
fn free_covariance<F>(
    cost: &F, params: &ParameterSet, problem: &FitProblem, warnings: &mut Vec<FitWarning>,
) -> ExplorerResult<Option<Array2<f64>>>
where
    F: Fn(&Array1<f64>) -> OptResult<f64>,
{
    if problem.n_free() == 0 {
        return Ok(Some(Array2::zeros((0, 0))));
    }
    let x_hat = problem.free_values(problem.base());
    let initial = initial_steps(params, problem);
    match observed_covariance(cost, &x_hat, &initial, &problem.limits(params)) {
        Ok(cov) => {
            if !cov.is_full_rank() {
                warnings.push(FitWarning::CovarianceNotPositiveDefinite { dropped: cov.dropped });
            }
            Ok(Some(cov.matrix))
        }
        Err(InferenceError::NotPositiveDefinite { .. }) => {
            warnings
                .push(FitWarning::CovarianceNotPositiveDefinite { dropped: problem.n_free() });
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// EDM at `x_hat`, NaN when the gradient cannot be evaluated there.
fn stationarity<F>(cost: &F, x_hat: &Array1<f64>, cov: &Array2<f64>) -> f64
where
    F: Fn(&Array1<f64>) -> OptResult<f64>,
{
    if x_hat.is_empty() {
        return 0.0;
    }
    central_gradient(cost, x_hat).map_or(f64::NAN, |g| edm(&g, cov))
}
