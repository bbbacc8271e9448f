//! loglik_optimizer::run — one L-BFGS run of a fit pass.
//!
//! Every pass of the explorer's fit protocol and every profile point of a
//! MINOS scan ends up here through [`maximize`](super::api::maximize): the
//! objective works in unconstrained internal coordinates, and this module
//! executes the solver and reports the maximum as an [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Execute `solver` from `theta0` and collect the maximum of ℓ.
///
/// The caller supplies the pre-built solver for the requested line search.
/// Errors are not retried here: a fit pass that gets `Err` switches to the
/// other line search and calls [`maximize`](super::api::maximize) again,
/// then reports status 2 with its start values if that fails as well.
///
/// With the `obs_slog` feature and `opts.verbose`, ℓ(θ₀) and ‖∇ℓ(θ₀)‖ are
/// written to stderr before the run and a slog observer prints every
/// iteration of this run only; each fit pass attaches its own observer.
///
/// # Errors
/// - Objective failures (model evaluation, non-finite cost) as the
///   [`OptError`](crate::optimization::errors::OptError) the objective
///   raised; argmin passes them through unchanged.
/// - Solver and line-search failures converted from `argmin::core::Error`.
/// - Invalid final parameters when building the [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: ell(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
