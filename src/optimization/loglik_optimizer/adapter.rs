//! Adapter that exposes a `LogLikelihood` as an `argmin` problem.
//!
//! Fit objectives (unbinned likelihoods and binned chi-square scores) are
//! written as log-likelihoods `ℓ(θ)` over internal, unbounded coordinates;
//! argmin minimizes the cost `c(θ) = -ℓ(θ)`. Analytic gradients are negated;
//! without one the **cost** closure is finite-differenced, so no sign flip is
//! needed in that branch.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `-ℓ(θ)` (negative log-likelihood).
/// - `Gradient::gradient` returns:
///   - `-∇ℓ(θ)` if the user provides an analytic gradient, or
///   - a finite-difference gradient of the cost (no sign flip needed).
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ) = -ℓ(θ)`.
    ///
    /// - Calls the user's `value(θ, data)` and checks the result is finite.
    /// - Returns `Error(NonFiniteCost)` if the value is not finite.
    ///
    /// # Errors
    /// Propagates any `OptError` from the user’s `value` via `?`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// Behavior:
    /// - If the user implements `grad(θ, data)`, we validate it and return `-grad`
    ///   (because the cost is `-ℓ`).
    /// - Otherwise, we compute a finite-difference gradient of the **cost**:
    ///   - Try *central* differences first.
    ///   - If any evaluation of the `cost` closure failed (captured via
    ///     `closure_err`), retry with *forward* differences.
    ///   - Validate the FD gradient; if it fails (e.g., non-finite), retry once
    ///     with *forward* differences and validate again.
    ///
    /// Implementation notes:
    /// - The FD closure must return `f64`, so we can’t use `?` inside it; we capture
    ///   the first error in `closure_err` and return `NaN` from the closure. After
    ///   FD, we turn that captured error back into a real error (or switch to
    ///   forward diff).
    ///
    /// # Errors
    /// - Propagates user errors from `grad` (non-`GradientNotImplemented`).
    /// - Propagates any error raised by cost evaluations performed during FD.
    /// - Returns validation errors if the gradient has wrong dimension or
    ///   non-finite entries.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(e) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                match e {
                    OptError::GradientNotImplemented => {
                        let cost_func = |theta: &Theta| -> f64 {
                            match self.cost(theta) {
                                Ok(val) => val,
                                Err(e) => {
                                    let mut slot = closure_err.borrow_mut();
                                    if slot.is_none() {
                                        *slot = Some(e);
                                    }
                                    f64::NAN
                                }
                            }
                        };
                        let mut fd_grad = theta.central_diff(&cost_func);
                        if closure_err.borrow().is_some() {
                            return Ok(run_fd_diff(theta, &cost_func, &closure_err)?);
                        }
                        match validate_grad(&fd_grad, dim) {
                            Ok(()) => Ok(fd_grad),
                            Err(_) => {
                                fd_grad = run_fd_diff(theta, &cost_func, &closure_err)?;
                                Ok(fd_grad)
                            }
                        }
                    }
                    _ => Err(e.into()),
                }
            }
        }
    }
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `LogLikelihood` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Cost sign convention and non-finite guard.
    // - Analytic gradient negation and the finite-difference fallback.
    // - Model errors raised during finite differencing.
    // -------------------------------------------------------------------------

    struct Parabola {
        analytic: bool,
    }

    impl LogLikelihood for Parabola {
        type Data = f64;

        fn value(&self, theta: &Theta, center: &f64) -> OptResult<f64> {
            if theta[0] > 100.0 {
                return Err(OptError::ModelEvaluation { text: "outside support".into() });
            }
            Ok(-(theta[0] - center).powi(2))
        }

        fn check(&self, _theta: &Theta, _data: &f64) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, center: &f64) -> OptResult<Grad> {
            if self.analytic {
                Ok(Array1::from(vec![-2.0 * (theta[0] - center)]))
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    #[test]
    fn cost_is_negated_log_likelihood() {
        let model = Parabola { analytic: true };
        let adapter = ArgMinAdapter::new(&model, &1.0);
        let cost = adapter.cost(&Array1::from(vec![3.0])).unwrap();
        assert_eq!(cost, 4.0);
    }

    #[test]
    // Purpose
    // -------
    // The analytic and finite-difference gradient paths agree on the cost
    // gradient `2(θ − c)`.
    //
    // Given
    // -----
    // - The same parabola with and without an analytic gradient.
    //
    // Expect
    // ------
    // - Both gradients equal 4 at θ = 3, c = 1.
    fn gradient_paths_agree_on_cost_gradient() {
        // Arrange
        let exact = Parabola { analytic: true };
        let fd = Parabola { analytic: false };
        let theta = Array1::from(vec![3.0]);

        // Act
        let g_exact = ArgMinAdapter::new(&exact, &1.0).gradient(&theta).unwrap();
        let g_fd = ArgMinAdapter::new(&fd, &1.0).gradient(&theta).unwrap();

        // Assert
        assert_relative_eq!(g_exact[0], 4.0);
        assert_relative_eq!(g_fd[0], 4.0, max_relative = 1e-5);
    }

    #[test]
    fn model_errors_surface_from_cost() {
        let model = Parabola { analytic: false };
        let adapter = ArgMinAdapter::new(&model, &1.0);
        let err: OptError = adapter.cost(&Array1::from(vec![200.0])).unwrap_err().into();
        assert!(err.to_string().contains("outside support"));
    }
}
