//! explorer::objective — fit objectives in unconstrained internal coordinates.
//!
//! Purpose
//! -------
//! Bridge a [`SpectrumModel`] and its [`ParameterSet`] to the
//! [`LogLikelihood`] interface of the optimizer. Only floating parameters
//! enter the optimizer vector, and each of them is mapped through a
//! [`BoundTransform`] so the solver never sees a limit.
//!
//! Key behaviors
//! -------------
//! - [`FitProblem`] freezes the parameter layout of one pass: the full
//!   value vector, the positions of the floating parameters, and their
//!   transforms.
//! - [`UnbinnedNll`] evaluates `ℓ = −NLL` (extended or not, with weight
//!   power 1 or 2).
//! - [`BinnedChi2`] evaluates `ℓ = −χ²/2`, so that the curvature of the cost
//!   inverts to the parameter covariance as for the likelihood.
//! - [`FitObjective`] exposes the problem layout and converts the maximized
//!   `ℓ` back into the statistic a fit reports (NLL or χ²).
//! - Gradients are central differences in internal coordinates with a
//!   relative step of `1e-6`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Constant parameters keep the value they had when the problem was built.
//! - Internal starting points are nudged off exact limits so the internal
//!   gradient is not zero by construction.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Grad, LogLikelihood, Theta, finite_diff::central_gradient},
        numerical_stability::transformations::BoundTransform,
    },
    spectrum::{dataset::Dataset, model::SpectrumModel, params::ParameterSet},
    statistical_tests::chi_square::ChiSquareData,
};
use ndarray::Array1;

/// Parameter layout of a single optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct FitProblem {
    base: Array1<f64>,
    free: Vec<usize>,
    transforms: Vec<BoundTransform>,
}

impl FitProblem {
    pub fn new(params: &ParameterSet) -> Self {
        let free = params.free_indices();
        let transforms = free
            .iter()
            .map(|&i| {
                let p = params.at(i);
                BoundTransform::for_limits(p.min, p.max)
            })
            .collect();
        Self { base: params.values(), free, transforms }
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    /// Positions of the floating parameters in the full vector.
    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    /// Full value vector the problem was built from.
    pub fn base(&self) -> &Array1<f64> {
        &self.base
    }

    /// Internal starting point.
    pub fn start(&self) -> Theta {
        Array1::from_iter(self.free.iter().zip(self.transforms.iter()).map(|(&i, t)| {
            let x = t.interior_start(self.base[i]);
            t.to_internal(x)
        }))
    }

    /// Full external value vector for internal coordinates `u`.
    pub fn to_full(&self, u: &Theta) -> Array1<f64> {
        let mut full = self.base.clone();
        for ((&i, t), &ui) in self.free.iter().zip(self.transforms.iter()).zip(u.iter()) {
            full[i] = t.to_external(ui);
        }
        full
    }

    /// External values of the floating parameters taken from `full`.
    pub fn free_values(&self, full: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter(self.free.iter().map(|&i| full[i]))
    }

    /// Full vector with the floating parameters replaced by `x_free`.
    pub fn embed(&self, x_free: &Array1<f64>) -> Array1<f64> {
        let mut full = self.base.clone();
        for (&i, &x) in self.free.iter().zip(x_free.iter()) {
            full[i] = x;
        }
        full
    }

    /// `(min, max)` of each floating parameter.
    pub fn limits(&self, params: &ParameterSet) -> Vec<(f64, f64)> {
        self.free
            .iter()
            .map(|&i| {
                let p = params.at(i);
                (p.min, p.max)
            })
            .collect()
    }

    fn check_theta(&self, theta: &Theta) -> OptResult<()> {
        if theta.len() != self.free.len() {
            return Err(OptError::GradientDimMismatch {
                expected: self.free.len(),
                found: theta.len(),
            });
        }
        match theta.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(OptError::InvalidThetaInput { index, value: theta[index] }),
            None => Ok(()),
        }
    }
}

/// Objective driven by the fit passes.
pub trait FitObjective: LogLikelihood {
    fn problem(&self) -> &FitProblem;

    /// Statistic reported by a fit, recovered from the maximized `ℓ`.
    fn statistic(&self, loglik: f64) -> f64;
}

/// Unbinned (extended) negative log-likelihood objective.
#[derive(Debug, Clone)]
pub struct UnbinnedNll<'a, M: SpectrumModel> {
    model: &'a M,
    problem: FitProblem,
    extended: bool,
    weight_power: i32,
}

impl<'a, M: SpectrumModel> UnbinnedNll<'a, M> {
    /// Objective with weight power 1, extended when the model allows it.
    pub fn new(model: &'a M, problem: FitProblem) -> Self {
        Self { model, problem, extended: model.is_extendable(), weight_power: 1 }
    }

    /// Same objective with every event weight raised to `weight_power`.
    pub fn with_weight_power(mut self, weight_power: i32) -> Self {
        self.weight_power = weight_power;
        self
    }

    /// NLL at a full external value vector.
    pub fn nll_at(&self, full: &Array1<f64>, data: &Dataset) -> OptResult<f64> {
        Ok(self.model.nll(full, data, self.extended, self.weight_power)?)
    }
}

impl<M: SpectrumModel> LogLikelihood for UnbinnedNll<'_, M> {
    type Data = Dataset;

    fn value(&self, theta: &Theta, data: &Dataset) -> OptResult<f64> {
        Ok(-self.nll_at(&self.problem.to_full(theta), data)?)
    }

    fn check(&self, theta: &Theta, _data: &Dataset) -> OptResult<()> {
        self.problem.check_theta(theta)
    }

    fn grad(&self, theta: &Theta, data: &Dataset) -> OptResult<Grad> {
        central_gradient(&|u: &Theta| self.value(u, data), theta)
    }
}

impl<M: SpectrumModel> FitObjective for UnbinnedNll<'_, M> {
    fn problem(&self) -> &FitProblem {
        &self.problem
    }

    fn statistic(&self, loglik: f64) -> f64 {
        -loglik
    }
}

/// Binned χ² objective; `ℓ = −χ²/2`.
#[derive(Debug, Clone)]
pub struct BinnedChi2<'a, M: SpectrumModel> {
    model: &'a M,
    problem: FitProblem,
}

impl<'a, M: SpectrumModel> BinnedChi2<'a, M> {
    pub fn new(model: &'a M, problem: FitProblem) -> Self {
        Self { model, problem }
    }

    /// `(χ², used_bins)` at a full external value vector.
    pub fn chi2_at(&self, full: &Array1<f64>, data: &ChiSquareData) -> OptResult<(f64, usize)> {
        Ok(data.statistic(self.model, full)?)
    }
}

impl<M: SpectrumModel> LogLikelihood for BinnedChi2<'_, M> {
    type Data = ChiSquareData;

    fn value(&self, theta: &Theta, data: &ChiSquareData) -> OptResult<f64> {
        let (chi2, _) = self.chi2_at(&self.problem.to_full(theta), data)?;
        Ok(-0.5 * chi2)
    }

    fn check(&self, theta: &Theta, _data: &ChiSquareData) -> OptResult<()> {
        self.problem.check_theta(theta)
    }

    fn grad(&self, theta: &Theta, data: &ChiSquareData) -> OptResult<Grad> {
        central_gradient(&|u: &Theta| self.value(u, data), theta)
    }
}

impl<M: SpectrumModel> FitObjective for BinnedChi2<'_, M> {
    fn problem(&self) -> &FitProblem {
        &self.problem
    }

    fn statistic(&self, loglik: f64) -> f64 {
        -2.0 * loglik
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::params::Parameter;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Layout bookkeeping of `FitProblem` (free positions, embedding).
    // - Start values map back to (nudged) external values.
    // - Objective statistics and input checks are exercised by `fit` tests.
    // -------------------------------------------------------------------------

    fn params() -> ParameterSet {
        let mut set = ParameterSet::new(vec![
            Parameter::new("n_sig", 0.0, 0.0, 1e4).unwrap(),
            Parameter::fixed("mean_X", 5.28).unwrap(),
            Parameter::new("k", -20.0, -100.0, 100.0).unwrap(),
        ])
        .unwrap();
        set.set_constant("mean_X", true).unwrap();
        set
    }

    #[test]
    // Purpose
    // -------
    // Only floating parameters are mapped, and constants keep their values.
    //
    // Given
    // -----
    // - (n_sig free at its lower limit, mean_X constant, k free).
    //
    // Expect
    // ------
    // - Free positions [0, 2]; `to_full(start)` leaves mean_X untouched,
    //   moves n_sig just off zero, and reproduces k.
    fn problem_maps_only_free_parameters() {
        // Arrange
        let problem = FitProblem::new(&params());

        // Act
        let full = problem.to_full(&problem.start());

        // Assert
        assert_eq!(problem.free_indices(), &[0, 2]);
        assert_eq!(full[1], 5.28);
        assert!(full[0] > 0.0 && full[0] < 1e-2);
        assert_relative_eq!(full[2], -20.0, max_relative = 1e-12);
    }

    #[test]
    fn embed_and_free_values_are_inverse() {
        let set = params();
        let problem = FitProblem::new(&set);
        let full = problem.embed(&array![12.0, -3.0]);
        assert_eq!(full, array![12.0, 5.28, -3.0]);
        assert_eq!(problem.free_values(&full), array![12.0, -3.0]);
        assert_eq!(problem.limits(&set), vec![(0.0, 1e4), (-100.0, 100.0)]);
    }
}
