//! spectrum::composite — sum-of-components model with explicit tags.
//!
//! Purpose
//! -------
//! Provide the concrete [`SpectrumModel`] used throughout the crate: a
//! weighted sum of tagged [`Component`]s sharing one [`ParameterSet`].
//!
//! Key behaviors
//! -------------
//! - Extended form ([`CompositeModel::extended`]): one yield per component,
//!   `f = Σ Nᵢ fᵢ / Σ Nᵢ` and `ν = Σ Nᵢ`.
//! - Fraction form ([`CompositeModel::fractions`]): `n − 1` fractions with
//!   the last component taking the remainder; not extendable.
//! - Component classes are carried by an explicit [`ComponentTag`] set at
//!   construction, never inferred from names.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every parameter name referenced by a shape or coefficient exists in the
//!   parameter set; this is checked once in the constructors and resolved to
//!   indices, so evaluation never does name lookups.
//! - Component names are unique.
use crate::spectrum::{
    errors::{ModelError, ModelResult},
    model::{ComponentInfo, ComponentTag, SpectrumModel},
    observable::Observable,
    params::ParameterSet,
    shapes::Shape,
};
use ndarray::Array1;

/// One tagged density component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub tag: ComponentTag,
    pub shape: Shape,
}

impl Component {
    pub fn new(name: impl Into<String>, tag: ComponentTag, shape: Shape) -> Self {
        Self { name: name.into(), tag, shape }
    }

    pub fn signal(name: impl Into<String>, shape: Shape) -> Self {
        Component::new(name, ComponentTag::Signal, shape)
    }

    pub fn background(name: impl Into<String>, shape: Shape) -> Self {
        Component::new(name, ComponentTag::Background, shape)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeModel {
    name: String,
    observable: Observable,
    params: ParameterSet,
    components: Vec<Component>,
    extended: bool,
    shape_index: Vec<Vec<usize>>,
    coef_index: Vec<usize>,
}

impl CompositeModel {
    /// Extended model with one yield parameter per component.
    ///
    /// # Errors
    /// - [`ModelError::InvalidComposition`] for an empty component list, a
    ///   yield count different from the component count, or duplicate names.
    /// - [`ModelError::MissingParameter`] for unknown parameter names.
    pub fn extended(
        name: impl Into<String>, observable: Observable, params: ParameterSet,
        components: Vec<Component>, yields: &[&str],
    ) -> ModelResult<Self> {
        if yields.len() != components.len() {
            return Err(ModelError::InvalidComposition {
                reason: format!(
                    "{} yields for {} components",
                    yields.len(),
                    components.len()
                ),
            });
        }
        Self::build(name.into(), observable, params, components, yields, true)
    }

    /// Non-extended model with `n − 1` fractions; the last component takes
    /// `1 − Σ fᵢ`.
    ///
    /// # Errors
    /// As for [`CompositeModel::extended`], with `n − 1` fractions expected.
    pub fn fractions(
        name: impl Into<String>, observable: Observable, params: ParameterSet,
        components: Vec<Component>, fractions: &[&str],
    ) -> ModelResult<Self> {
        if components.is_empty() || fractions.len() + 1 != components.len() {
            return Err(ModelError::InvalidComposition {
                reason: format!(
                    "{} fractions for {} components",
                    fractions.len(),
                    components.len()
                ),
            });
        }
        Self::build(name.into(), observable, params, components, fractions, false)
    }

    fn build(
        name: String, observable: Observable, params: ParameterSet, components: Vec<Component>,
        coefficients: &[&str], extended: bool,
    ) -> ModelResult<Self> {
        if components.is_empty() {
            return Err(ModelError::InvalidComposition {
                reason: "model needs at least one component".to_string(),
            });
        }
        for (i, c) in components.iter().enumerate() {
            if components[..i].iter().any(|o| o.name == c.name) {
                return Err(ModelError::InvalidComposition {
                    reason: format!("duplicate component name '{}'", c.name),
                });
            }
        }
        let shape_index = components
            .iter()
            .map(|c| {
                c.shape
                    .param_names()
                    .iter()
                    .map(|n| params.index_of(n))
                    .collect::<ModelResult<Vec<usize>>>()
            })
            .collect::<ModelResult<Vec<Vec<usize>>>>()?;
        let coef_index =
            coefficients.iter().map(|n| params.index_of(n)).collect::<ModelResult<Vec<usize>>>()?;
        Ok(Self { name, observable, params, components, extended, shape_index, coef_index })
    }

    /// Mixing weights (summing to one) at `values`.
    fn mixing_weights(&self, values: &Array1<f64>) -> ModelResult<Vec<f64>> {
        if self.extended {
            let yields: Vec<f64> = self.coef_index.iter().map(|&i| values[i]).collect();
            let total: f64 = yields.iter().sum();
            if !(total > 0.0) || !total.is_finite() {
                return Err(ModelError::InvalidExpectedEvents { value: total });
            }
            Ok(yields.into_iter().map(|n| n / total).collect())
        } else {
            let mut w: Vec<f64> = self.coef_index.iter().map(|&i| values[i]).collect();
            let rest = 1.0 - w.iter().sum::<f64>();
            w.push(rest);
            Ok(w)
        }
    }

    fn check_len(&self, values: &Array1<f64>) -> ModelResult<()> {
        if values.len() != self.params.len() {
            return Err(ModelError::ParamLengthMismatch {
                expected: self.params.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }
}

impl SpectrumModel for CompositeModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn observable(&self) -> &Observable {
        &self.observable
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn is_extendable(&self) -> bool {
        self.extended
    }

    fn components(&self) -> Vec<ComponentInfo> {
        self.components.iter().map(|c| ComponentInfo { name: c.name.clone(), tag: c.tag }).collect()
    }

    fn pdf_values(&self, xs: &Array1<f64>, values: &Array1<f64>) -> ModelResult<Array1<f64>> {
        let parts = self.component_densities(xs, values)?;
        let mut total = Array1::zeros(xs.len());
        for part in parts {
            total += &part;
        }
        Ok(total)
    }

    fn component_densities(
        &self, xs: &Array1<f64>, values: &Array1<f64>,
    ) -> ModelResult<Vec<Array1<f64>>> {
        self.check_len(values)?;
        let weights = self.mixing_weights(values)?;
        let (lo, hi) = (self.observable.min(), self.observable.max());
        self.components
            .iter()
            .zip(self.shape_index.iter())
            .zip(weights)
            .map(|((c, idx), w)| -> ModelResult<Array1<f64>> {
                let p: Vec<f64> = idx.iter().map(|&i| values[i]).collect();
                Ok(c.shape.density(&c.name, xs, &p, lo, hi)? * w)
            })
            .collect()
    }

    fn expected_events(&self, values: &Array1<f64>) -> ModelResult<f64> {
        if !self.extended {
            return Err(ModelError::NotExtendable { model: self.name.clone() });
        }
        self.check_len(values)?;
        Ok(self.coef_index.iter().map(|&i| values[i]).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{dataset::Dataset, params::Parameter};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Construction guards (coefficient counts, unknown names).
    // - Mixture normalization, component bookkeeping, expected events.
    // - Extended NLL pieces and sampling (range, size, rough shape).
    //
    // Fitting behavior is covered in `explorer`.
    // -------------------------------------------------------------------------

    fn mass() -> Observable {
        Observable::new("m", 5.2, 5.3, 50).unwrap()
    }

    fn sb_model() -> CompositeModel {
        let params = ParameterSet::new(vec![
            Parameter::new("n_sig", 200.0, 0.0, 1e4).unwrap(),
            Parameter::new("n_bkg", 800.0, 0.0, 1e5).unwrap(),
            Parameter::new("mean_X", 5.25, 5.2, 5.3).unwrap(),
            Parameter::new("sigma_X", 0.005, 1e-4, 0.05).unwrap(),
            Parameter::new("k", -10.0, -100.0, 100.0).unwrap(),
        ])
        .unwrap();
        CompositeModel::extended(
            "model",
            mass(),
            params,
            vec![
                Component::signal(
                    "sig_X",
                    Shape::Gaussian { mean: "mean_X".into(), sigma: "sigma_X".into() },
                ),
                Component::background("bkgr", Shape::Exponential { slope: "k".into() }),
            ],
            &["n_sig", "n_bkg"],
        )
        .unwrap()
    }

    #[test]
    fn rejects_wrong_coefficient_count_and_unknown_names() {
        let params = ParameterSet::new(vec![Parameter::free("k", -1.0).unwrap()]).unwrap();
        let comps = vec![Component::background("b", Shape::Exponential { slope: "k".into() })];
        let err =
            CompositeModel::extended("m", mass(), params.clone(), comps.clone(), &[]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidComposition { .. }));
        let bad = vec![Component::background("b", Shape::Exponential { slope: "q".into() })];
        let err = CompositeModel::fractions("m", mass(), params, bad, &[]).unwrap_err();
        assert_eq!(err, ModelError::MissingParameter { name: "q".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Component contributions add up to the normalized mixture.
    //
    // Given
    // -----
    // - Extended Gaussian + exponential with yields 200/800.
    //
    // Expect
    // ------
    // - Bin integrals over the full range sum to one.
    // - Signal share of the component integrals equals 0.2.
    // - ν = 1000.
    fn mixture_is_normalized_and_components_sum_to_total() {
        // Arrange
        let model = sb_model();
        let values = model.parameters().values();
        let edges = Array1::linspace(5.2, 5.3, 101);

        // Act
        let integrals = model.bin_integrals(&edges, &values).unwrap();
        let xs = Array1::linspace(5.2, 5.3, 11);
        let total = model.pdf_values(&xs, &values).unwrap();
        let parts = model.component_densities(&xs, &values).unwrap();

        // Assert
        assert_abs_diff_eq!(integrals.sum(), 1.0, epsilon = 1e-8);
        for i in 0..xs.len() {
            assert_relative_eq!(parts[0][i] + parts[1][i], total[i], max_relative = 1e-12);
        }
        assert_relative_eq!(model.expected_events(&values).unwrap(), 1000.0);
        assert_eq!(model.components()[0].tag, ComponentTag::Signal);
    }

    #[test]
    fn fraction_model_is_not_extendable() {
        let params = ParameterSet::new(vec![
            Parameter::new("f", 0.3, 0.0, 1.0).unwrap(),
            Parameter::free("k", -5.0).unwrap(),
        ])
        .unwrap();
        let model = CompositeModel::fractions(
            "m",
            mass(),
            params,
            vec![
                Component::background("flat", Shape::Uniform),
                Component::background("exp", Shape::Exponential { slope: "k".into() }),
            ],
            &["f"],
        )
        .unwrap();
        let values = model.parameters().values();
        assert!(!model.is_extendable());
        assert!(matches!(model.expected_events(&values), Err(ModelError::NotExtendable { .. })));
        let edges = Array1::linspace(5.2, 5.3, 21);
        assert_abs_diff_eq!(model.bin_integrals(&edges, &values).unwrap().sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The extended term equals `ν − N ln ν` for unit weights.
    //
    // Given
    // -----
    // - Three unweighted events and the s+b model.
    //
    // Expect
    // ------
    // - `nll(extended) − nll(non-extended) = ν − 3 ln ν`.
    fn extended_nll_adds_poisson_term() {
        // Arrange
        let model = sb_model();
        let values = model.parameters().values();
        let data = Dataset::new(mass(), Array1::from(vec![5.22, 5.25, 5.27])).unwrap();

        // Act
        let ext = model.nll(&values, &data, true, 1).unwrap();
        let plain = model.nll(&values, &data, false, 1).unwrap();

        // Assert
        assert_relative_eq!(ext - plain, 1000.0 - 3.0 * 1000.0_f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn sampling_is_reproducible_and_in_range() {
        let model = sb_model();
        let mut rng1 = StdRng::seed_from_u64(11);
        let mut rng2 = StdRng::seed_from_u64(11);
        let a = model.sample(500, &mut rng1).unwrap();
        let b = model.sample(500, &mut rng2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
        assert!(a.values().iter().all(|&x| (5.2..=5.3).contains(&x)));
        // About 20% of the events sit within 3σ of the peak from the signal.
        let near_peak = a.values().iter().filter(|&&x| (x - 5.25).abs() < 0.015).count();
        assert!(near_peak > 100 && near_peak < 300, "near_peak = {near_peak}");
    }
}
