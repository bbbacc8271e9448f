//! High-level entry point for maximizing a user-provided `LogLikelihood`.
//!
//! This selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the model in an `ArgMinAdapter` (which *minimizes* `-ℓ(θ)`),
//! and delegates the run to `run_lbfgs`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize a log-likelihood `ℓ(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Wraps `(f, data)` in an `ArgMinAdapter` that exposes a *minimization*
///   problem `c(θ) = -ℓ(θ)` to `argmin`.
/// - Builds an L-BFGS solver with either **Hager–Zhang** or **More–Thuente**
///   line search based on `opts.line_searcher`.
/// - Calls `run_lbfgs`, which configures the executor (initial params,
///   max iters, optional observers) and returns an `OptimOutcome`.
///
/// # Parameters
/// - `f`: Your model implementing [`LogLikelihood`].
/// - `theta0`: Initial parameter vector.
/// - `data`: Model data passed through to `value`/`grad`.
/// - `opts`: Optimizer options (tolerances, line search choice, verbosity, etc.).
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates runtime errors from `run_lbfgs` (e.g., line search failures).
///
/// # Returns
/// An [`OptimOutcome`] containing `theta_hat`, best value `ℓ(θ̂)`,
/// termination status, iteration counts, function evaluation counts, and
/// optionally the gradient norm.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use spectrum_explorer::optimization::{
///     errors::{OptError, OptResult},
///     loglik_optimizer::{LogLikelihood, MLEOptions, Theta, maximize},
/// };
///
/// struct Peak;
/// impl LogLikelihood for Peak {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Peak, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{errors::OptError, loglik_optimizer::Tolerances};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - End-to-end maximization of a smooth concave objective with both line
    //   searches and the finite-difference gradient.
    // - Rejection of invalid starting points through `check`.
    // -------------------------------------------------------------------------

    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = (f64, f64);

        fn value(&self, theta: &Theta, c: &(f64, f64)) -> OptResult<f64> {
            Ok(-((theta[0] - c.0).powi(2) + 4.0 * (theta[1] - c.1).powi(2)))
        }

        fn check(&self, theta: &Theta, _c: &(f64, f64)) -> OptResult<()> {
            match theta.iter().position(|v| !v.is_finite()) {
                Some(index) => Err(OptError::InvalidThetaInput { index, value: theta[index] }),
                None => Ok(()),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches locate the maximum of a separable quadratic.
    //
    // Given
    // -----
    // - ℓ(θ) = −(θ₀−1)² − 4(θ₁+2)² started at the origin.
    //
    // Expect
    // ------
    // - θ̂ ≈ (1, −2), ℓ(θ̂) ≈ 0, status code 0.
    fn maximize_finds_quadratic_peak_with_both_line_searches() {
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            // Arrange
            let tols = Tolerances::new(Some(1e-6), None, Some(200)).unwrap();
            let opts = MLEOptions::new(tols, ls, false, None).unwrap();

            // Act
            let out = maximize(&Bowl, array![0.0, 0.0], &(1.0, -2.0), &opts).unwrap();

            // Assert
            assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-4);
            assert_abs_diff_eq!(out.theta_hat[1], -2.0, epsilon = 1e-4);
            assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-7);
            assert_eq!(out.status_code(), 0);
        }
    }

    #[test]
    fn maximize_rejects_non_finite_start() {
        let err =
            maximize(&Bowl, array![f64::NAN, 0.0], &(0.0, 0.0), &MLEOptions::default()).unwrap_err();
        assert!(matches!(err, OptError::InvalidThetaInput { index: 0, .. }));
    }
}
