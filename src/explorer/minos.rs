//! explorer::minos — profile-likelihood intervals for a single parameter.
//!
//! The profile cost `p(v)` fixes the parameter of interest at `v` and
//! re-minimizes every other floating parameter. Each side of the interval is
//! found by doubling the step away from the minimum until `p` rises by
//! `up`, then bisecting the bracket and interpolating linearly inside the
//! final one. A side that reaches the parameter bound (or exhausts its
//! bracketing budget) is reported with its `*_at_limit` flag set.
use crate::{
    explorer::{
        errors::{ExplorerError, ExplorerResult},
        fit::run_pass,
        objective::{FitObjective, FitProblem},
        options::MinosOptions,
        results::MinosError,
    },
    optimization::loglik_optimizer::MLEOptions,
    spectrum::params::ParameterSet,
};

/// Initial scan step as a fraction of the parameter's magnitude when no
/// parabolic error is known.
const FALLBACK_STEP: f64 = 1e-2;

/// Asymmetric interval of `poi` around the minimum described by `fitted`.
///
/// `build` creates the objective for a given parameter layout (likelihood
/// or χ²); the interval is where its cost is within `minos.up` of the
/// profile minimum.
///
/// # Errors
/// - [`ExplorerError::MissingParameter`] if `poi` is unknown.
/// - [`ExplorerError::InvalidArgument`] if `poi` is constant.
/// - Evaluation failures of the profile fits.
pub fn minos_interval<L, B>(
    fitted: &ParameterSet, poi: &str, data: &L::Data, opts: &MLEOptions, minos: &MinosOptions,
    build: B,
) -> ExplorerResult<MinosError>
where
    L: FitObjective,
    B: Fn(FitProblem) -> L,
{
    let param = fitted.get(poi)?;
    if param.constant {
        return Err(ExplorerError::argument(format!(
            "MINOS parameter '{poi}' is constant"
        )));
    }
    let value = param.value;
    let step0 = match param.error {
        Some(e) if e.is_finite() && e > 0.0 => e,
        _ => FALLBACK_STEP * value.abs().max(1.0),
    };
    let profile = |v: f64| -> ExplorerResult<f64> {
        let mut params = fitted.clone();
        params.set_value(poi, v)?;
        params.set_constant(poi, true)?;
        Ok(run_pass(&build(FitProblem::new(&params)), data, opts, 0)?.cost)
    };
    let scan = Scan { value, step0, target: profile(value)? + minos.up, minos };
    let (lower, lower_at_limit) = scan.side(&profile, -1.0, param.min)?;
    let (upper, upper_at_limit) = scan.side(&profile, 1.0, param.max)?;
    Ok(MinosError {
        parameter: poi.to_string(),
        value,
        lower,
        upper,
        lower_at_limit,
        upper_at_limit,
    })
}

// ---- Helper methods ----

struct Scan<'a> {
    value: f64,
    step0: f64,
    target: f64,
    minos: &'a MinosOptions,
}

impl Scan<'_> {
    /// Signed offset of the crossing on the side `dir` (±1), and whether the
    /// side stopped at `bound` or without a bracket.
    fn side<P>(&self, profile: &P, dir: f64, bound: f64) -> ExplorerResult<(f64, bool)>
    where
        P: Fn(f64) -> ExplorerResult<f64>,
    {
        let mut inner = (self.value, self.target - self.minos.up);
        let mut outer = None;
        let mut step = self.step0;
        for _ in 0..self.minos.max_iter {
            let mut x = self.value + dir * step;
            let clipped = (x - bound) * dir >= 0.0;
            if clipped {
                x = bound;
            }
            let f = profile(x)?;
            if f >= self.target {
                outer = Some((x, f));
                break;
            }
            inner = (x, f);
            if clipped {
                return Ok((x - self.value, true));
            }
            step *= 2.0;
        }
        let Some(mut outer) = outer else {
            return Ok((inner.0 - self.value, true));
        };

        let width = self.minos.tolerance * self.step0;
        for _ in 0..self.minos.max_iter {
            if (outer.0 - inner.0).abs() <= width {
                break;
            }
            let mid = 0.5 * (inner.0 + outer.0);
            let f = profile(mid)?;
            if f < self.target {
                inner = (mid, f);
            } else {
                outer = (mid, f);
            }
        }
        let rise = outer.1 - inner.1;
        let crossing = if rise > 0.0 {
            inner.0 + (self.target - inner.1) / rise * (outer.0 - inner.0)
        } else {
            0.5 * (inner.0 + outer.0)
        };
        Ok((crossing - self.value, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        explorer::{fit::fit_likelihood, objective::UnbinnedNll},
        spectrum::{
            composite::{Component, CompositeModel},
            dataset::Dataset,
            model::SpectrumModel,
            observable::Observable,
            params::Parameter,
            shapes::Shape,
        },
    };
    use approx::assert_relative_eq;
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Symmetric interval ±σ/√N for a Gaussian mean with known width.
    // - Bound handling and the constant-parameter guard.
    // -------------------------------------------------------------------------

    const SIGMA: f64 = 0.01;
    const N: usize = 1000;

    fn setup() -> (CompositeModel, Dataset) {
        let obs = Observable::new("m", 5.2, 5.3, 50).unwrap();
        let params = ParameterSet::new(vec![
            Parameter::new("mean_X", 5.25, 5.2, 5.3).unwrap(),
            Parameter::fixed("sigma_X", SIGMA).unwrap(),
        ])
        .unwrap();
        let model = CompositeModel::fractions(
            "gauss",
            obs,
            params,
            vec![Component::signal(
                "sig_X",
                Shape::Gaussian { mean: "mean_X".into(), sigma: "sigma_X".into() },
            )],
            &[],
        )
        .unwrap();
        let data = model.sample(N, &mut StdRng::seed_from_u64(21)).unwrap();
        (model, data)
    }

    fn fitted(model: &CompositeModel, data: &Dataset) -> ParameterSet {
        fit_likelihood(model, data, &[], false, &MLEOptions::default())
            .unwrap()
            .parameters()
            .clone()
    }

    #[test]
    // Purpose
    // -------
    // The profile interval of a Gaussian mean with fixed width is the
    // parabolic one, `±σ/√N`.
    //
    // Given
    // -----
    // - 1000 events from N(5.25, 0.01²); σ constant; default `up = 0.5`.
    //
    // Expect
    // ------
    // - lower ≈ −σ/√N and upper ≈ +σ/√N within 2 %; both sides valid.
    fn gaussian_mean_interval_is_symmetric() {
        // Arrange
        let (model, data) = setup();
        let params = fitted(&model, &data);

        // Act
        let interval = minos_interval(
            &params,
            "mean_X",
            &data,
            &MLEOptions::default(),
            &MinosOptions::default(),
            |p| UnbinnedNll::new(&model, p),
        )
        .unwrap();

        // Assert
        let expected = SIGMA / (N as f64).sqrt();
        assert!(interval.is_valid());
        assert!(interval.lower < 0.0 && interval.upper > 0.0);
        assert_relative_eq!(-interval.lower, expected, max_relative = 0.02);
        assert_relative_eq!(interval.upper, expected, max_relative = 0.02);
    }

    #[test]
    // Purpose
    // -------
    // A bound inside the interval stops the scan and flags that side.
    //
    // Given
    // -----
    // - The fitted mean with its lower limit moved to μ̂ − 0.1σ/√N.
    //
    // Expect
    // ------
    // - `lower_at_limit`, lower offset equal to the distance to the limit;
    //   the upper side stays a proper crossing.
    fn bound_inside_interval_is_flagged() {
        let (model, data) = setup();
        let mut params = fitted(&model, &data);
        let mean_hat = params.value("mean_X").unwrap();
        let gap = 0.1 * SIGMA / (N as f64).sqrt();
        params.get_mut("mean_X").unwrap().min = mean_hat - gap;

        let interval = minos_interval(
            &params,
            "mean_X",
            &data,
            &MLEOptions::default(),
            &MinosOptions::default(),
            |p| UnbinnedNll::new(&model, p),
        )
        .unwrap();

        assert!(interval.lower_at_limit);
        assert!(!interval.upper_at_limit);
        assert_relative_eq!(interval.lower, -gap, max_relative = 1e-9);
    }

    #[test]
    fn constant_parameter_is_rejected() {
        let (model, data) = setup();
        let err = minos_interval(
            model.parameters(),
            "sigma_X",
            &data,
            &MLEOptions::default(),
            &MinosOptions::default(),
            |p| UnbinnedNll::new(&model, p),
        )
        .unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidArgument { .. }));
    }
}
