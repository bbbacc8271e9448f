//! Consistency checks shared by the optimizer and the fit engine.
//!
//! Each helper returns the first offending entry as a typed [`OptError`];
//! nothing here panics.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, types::Hessian},
};

/// `None`, or a finite, strictly positive gradient-norm tolerance.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        positive_finite(tol).map_err(|reason| OptError::InvalidTolGrad { tol, reason })?;
    }
    Ok(())
}

/// `None`, or a finite, strictly positive cost-change tolerance.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        positive_finite(tol).map_err(|reason| OptError::InvalidTolCost { tol, reason })?;
    }
    Ok(())
}

/// Gradient of length `dim` with finite entries.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] on a length mismatch.
/// - [`OptError::InvalidGradient`] for the first non-finite element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidGradient {
            index,
            value: grad[index],
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best point, rejecting a missing or non-finite one.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    match t.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidThetaHat {
            index,
            value: t[index],
            reason: "Parameter estimates must be finite.",
        }),
        None => Ok(t),
    }
}

/// Objective values must be finite; sign is irrelevant.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// `dim × dim` matrix with finite entries.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] on a shape mismatch.
/// - [`OptError::InvalidHessian`] with the row/col of the first bad entry.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}

fn positive_finite(tol: f64) -> Result<(), &'static str> {
    if !tol.is_finite() {
        return Err("Tolerance must be finite.");
    }
    if tol <= 0.0 {
        return Err("Tolerance must be positive.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Accept/reject behavior of each check, including the reported index.
    // -------------------------------------------------------------------------

    #[test]
    fn tolerances_accept_none_and_positive_values() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(1e-4)).is_ok());
        assert!(verify_tol_cost(Some(1e-9)).is_ok());
        assert!(matches!(
            verify_tol_grad(Some(0.0)),
            Err(OptError::InvalidTolGrad { reason: "Tolerance must be positive.", .. })
        ));
        assert!(matches!(
            verify_tol_cost(Some(f64::INFINITY)),
            Err(OptError::InvalidTolCost { reason: "Tolerance must be finite.", .. })
        ));
    }

    #[test]
    fn gradient_checks_report_first_bad_entry() {
        let g = Array1::from(vec![0.0, f64::NAN, f64::INFINITY]);
        assert!(matches!(validate_grad(&g, 3), Err(OptError::InvalidGradient { index: 1, .. })));
        assert!(matches!(
            validate_grad(&g, 2),
            Err(OptError::GradientDimMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn theta_hat_must_exist_and_be_finite() {
        assert!(matches!(validate_theta_hat(None), Err(OptError::MissingThetaHat)));
        let bad = Array1::from(vec![1.0, f64::NEG_INFINITY]);
        assert!(matches!(
            validate_theta_hat(Some(bad)),
            Err(OptError::InvalidThetaHat { index: 1, .. })
        ));
    }

    #[test]
    fn hessian_shape_and_entries_are_checked() {
        let mut h = Array2::<f64>::eye(2);
        assert!(validate_hessian(&h, 2).is_ok());
        assert!(matches!(validate_hessian(&h, 3), Err(OptError::HessianDimMismatch { .. })));
        h[[1, 0]] = f64::NAN;
        assert!(matches!(
            validate_hessian(&h, 2),
            Err(OptError::InvalidHessian { row: 1, col: 0, .. })
        ));
    }
}
