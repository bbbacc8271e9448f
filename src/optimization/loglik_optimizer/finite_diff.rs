//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference derivatives of scalar objectives so the rest
//! of the crate can request gradients and curvature without depending on
//! the `finitediff` API or re-deriving step-size rules.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward-difference gradient with error capture, used
//!   by the argmin adapter as the fallback of its central-difference path.
//! - [`central_gradient`]: fallible central-difference gradient with
//!   relative steps `h = 1e-6 · max(1, |θ|)`.
//! - [`tune_steps`]: per-coordinate step sizes chosen so that the objective
//!   rises by about [`TARGET_RISE`] on each side, shrunk to stay inside the
//!   coordinate limits.
//! - [`compute_hessian`]: value-based central-difference Hessian with a
//!   forward-difference fallback, validated and symmetrized.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives passed to the value-based helpers return `OptResult<f64>`;
//!   the first evaluation error aborts the computation.
//! - Returned gradients and Hessians satisfy [`validate_grad`] and
//!   [`validate_hessian`].
//!
//! Conventions
//! -----------
//! - Objectives are costs (negative log-likelihoods); the Hessian of the
//!   cost at a minimum is positive semi-definite.
//! - Coordinate limits are `(lower, upper)` pairs with infinities for
//!   one-sided or free coordinates.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the closure-error path, non-finite detection, exact
//!   recovery of quadratic curvature, and step shrinking near limits.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2};
use std::cell::RefCell;

/// Objective rise per side targeted by [`tune_steps`].
pub const TARGET_RISE: f64 = 0.05;

/// Rounds of step rescaling performed by [`tune_steps`].
const TUNING_ROUNDS: usize = 4;

/// Step rescaling factors are clamped to `[MIN_RESCALE, MAX_RESCALE]`.
const MIN_RESCALE: f64 = 0.1;
const MAX_RESCALE: f64 = 10.0;

/// Forward-difference gradient of `func` at `theta` with error capture.
///
/// `func` cannot return a `Result` inside `finitediff`, so callers route any
/// evaluation error into `closure_err` and return `NaN`. The cell is cleared
/// on entry and inspected afterwards.
///
/// # Errors
/// - The error captured in `closure_err`, converted into `OptError`.
/// - [`validate_grad`] failures for wrong length or non-finite entries.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

/// Central-difference gradient of a fallible objective.
///
/// # Errors
/// The first evaluation error of `f`, or a [`validate_grad`] failure.
pub fn central_gradient<F>(f: &F, theta: &Theta) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let mut grad = Array1::zeros(theta.len());
    let mut probe = theta.clone();
    for i in 0..theta.len() {
        let h = 1e-6 * theta[i].abs().max(1.0);
        probe[i] = theta[i] + h;
        let up = f(&probe)?;
        probe[i] = theta[i] - h;
        let down = f(&probe)?;
        probe[i] = theta[i];
        grad[i] = (up - down) / (2.0 * h);
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

/// Per-coordinate Hessian steps for a cost `f` around `theta`.
///
/// Starting from `initial`, each step is rescaled (at most
/// [`TUNING_ROUNDS`] times, by a factor clamped to `[0.1, 10]`) so that
/// `f(θ+h) + f(θ−h) − 2f(θ) ≈ 2·TARGET_RISE`. Steps never reach past half the
/// distance to the nearer limit in `limits`; a coordinate sitting on a limit
/// keeps a tiny step.
///
/// # Errors
/// The first evaluation error of `f`.
pub fn tune_steps<F>(
    f: &F, theta: &Theta, initial: &Array1<f64>, limits: &[(f64, f64)],
) -> OptResult<Array1<f64>>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let f0 = f(theta)?;
    let mut steps = initial.clone();
    let mut probe = theta.clone();
    for i in 0..theta.len() {
        let x = theta[i];
        let (lo, hi) = limits.get(i).copied().unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
        let room = 0.5 * (x - lo).min(hi - x);
        let floor = 1e-12 * x.abs().max(1.0);
        let cap = if room > floor { room } else { floor };
        let mut h = steps[i].abs().clamp(floor, cap);
        for _ in 0..TUNING_ROUNDS {
            probe[i] = x + h;
            let up = f(&probe)?;
            probe[i] = x - h;
            let down = f(&probe)?;
            probe[i] = x;
            let rise = up + down - 2.0 * f0;
            if !rise.is_finite() || rise <= 0.0 {
                break;
            }
            let factor = (2.0 * TARGET_RISE / rise).sqrt().clamp(MIN_RESCALE, MAX_RESCALE);
            if (factor - 1.0).abs() < 0.1 {
                break;
            }
            h = (h * factor).clamp(floor, cap);
        }
        steps[i] = h;
    }
    Ok(steps)
}

/// Value-based finite-difference Hessian of `f` at `theta`.
///
/// Central second differences are tried first; if any entry is non-finite
/// the forward-difference stencil is used instead. The result is symmetrized.
///
/// # Errors
/// - The first evaluation error of `f`.
/// - `OptError::InvalidHessian` when both stencils yield non-finite entries.
pub fn compute_hessian<F>(f: &F, theta: &Theta, steps: &Array1<f64>) -> OptResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let dim = theta.len();
    let mut cent_hess = central_hessian(f, theta, steps)?;
    match validate_hessian(&cent_hess, dim) {
        Ok(_) => {
            symmetrize_hess(&mut cent_hess);
            Ok(cent_hess)
        }
        Err(_) => {
            let mut forward_hess = forward_hessian(f, theta, steps)?;
            validate_hessian(&forward_hess, dim)?;
            symmetrize_hess(&mut forward_hess);
            Ok(forward_hess)
        }
    }
}

// ---- Helper methods ----

fn central_hessian<F>(f: &F, theta: &Theta, steps: &Array1<f64>) -> OptResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let dim = theta.len();
    let f0 = f(theta)?;
    let mut hess = Array2::zeros((dim, dim));
    let mut probe = theta.clone();
    for i in 0..dim {
        let hi = steps[i];
        probe[i] = theta[i] + hi;
        let up = f(&probe)?;
        probe[i] = theta[i] - hi;
        let down = f(&probe)?;
        probe[i] = theta[i];
        hess[[i, i]] = (up - 2.0 * f0 + down) / (hi * hi);
        for j in 0..i {
            let hj = steps[j];
            let mut corner = |si: f64, sj: f64| -> OptResult<f64> {
                probe[i] = theta[i] + si * hi;
                probe[j] = theta[j] + sj * hj;
                let v = f(&probe);
                probe[i] = theta[i];
                probe[j] = theta[j];
                v
            };
            let pp = corner(1.0, 1.0)?;
            let pm = corner(1.0, -1.0)?;
            let mp = corner(-1.0, 1.0)?;
            let mm = corner(-1.0, -1.0)?;
            hess[[i, j]] = (pp - pm - mp + mm) / (4.0 * hi * hj);
            hess[[j, i]] = hess[[i, j]];
        }
    }
    Ok(hess)
}

fn forward_hessian<F>(f: &F, theta: &Theta, steps: &Array1<f64>) -> OptResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let dim = theta.len();
    let f0 = f(theta)?;
    let mut probe = theta.clone();
    let mut single = Array1::zeros(dim);
    for i in 0..dim {
        probe[i] = theta[i] + steps[i];
        single[i] = f(&probe)?;
        probe[i] = theta[i];
    }
    let mut hess = Array2::zeros((dim, dim));
    for i in 0..dim {
        probe[i] = theta[i] + 2.0 * steps[i];
        let twice = f(&probe)?;
        probe[i] = theta[i];
        hess[[i, i]] = (twice - 2.0 * single[i] + f0) / (steps[i] * steps[i]);
        for j in 0..i {
            probe[i] = theta[i] + steps[i];
            probe[j] = theta[j] + steps[j];
            let both = f(&probe)?;
            probe[i] = theta[i];
            probe[j] = theta[j];
            hess[[i, j]] = (both - single[i] - single[j] + f0) / (steps[i] * steps[j]);
            hess[[j, i]] = hess[[i, j]];
        }
    }
    Ok(hess)
}

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
