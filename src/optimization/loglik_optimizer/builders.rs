//! loglik_optimizer::builders — L-BFGS solver construction.
//!
//! The fit engine picks a line search from its options and asks for a
//! configured solver; the builders apply the gradient and cost-change
//! tolerances and the history size. The starting point and `max_iters` are
//! runtime concerns applied by [`run_lbfgs`](super::run::run_lbfgs).
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// L-BFGS with a Hager–Zhang line search.
///
/// # Errors
/// Argmin's tolerance validation errors, converted into `OptError`.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// L-BFGS with a More–Thuente line search (the fit default).
///
/// # Errors
/// Argmin's tolerance validation errors, converted into `OptError`.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply the optional gradient and cost-change tolerances of `opts`.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Both builders accept default and explicit history sizes.
    // - Tolerances, present or absent, are applied without error.
    //
    // Solver runs are covered by the `api` tests and the fit engine.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both line-search builders succeed with the default fit options and with
    // an explicit history size.
    //
    // Given
    // -----
    // - `MLEOptions::default()` and options with `lbfgs_mem = Some(11)`.
    //
    // Expect
    // ------
    // - All four builds return `Ok(_)`.
    fn builders_accept_default_and_explicit_memory() {
        // Arrange
        let defaults = MLEOptions::default();
        let tols = Tolerances::new(Some(1e-6), None, Some(25)).expect("Tolerances should be valid");
        let explicit = MLEOptions::new(tols, LineSearcher::HagerZhang, false, Some(11))
            .expect("MLEOptions should be valid");

        // Act / Assert
        for opts in [&defaults, &explicit] {
            assert!(build_optimizer_hager_zhang(opts).is_ok());
            assert!(build_optimizer_more_thuente(opts).is_ok());
        }
    }

    #[test]
    fn configure_lbfgs_respects_absent_tolerances() {
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(50)).expect("Tolerances should be valid");
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None)
            .expect("MLEOptions should be valid");

        assert!(configure_lbfgs(raw, &opts).is_ok());
    }
}
