//! spectrum::params — named, bounded model parameters and structured keys.
//!
//! Purpose
//! -------
//! Represent the parameter set of a spectrum model as an ordered list of
//! named [`Parameter`]s (value, bounds, constant flag, fitted errors), and
//! provide structured [`ParamKey`] lookups so that callers never assemble
//! parameter names by string concatenation.
//!
//! Key behaviors
//! -------------
//! - Name lookups fail fast with [`ModelError::MissingParameter`].
//! - A [`ParamKey`] `(label, role)` resolves through an explicit binding
//!   table; [`ParameterSet::tag_resolution`] binds the conventional
//!   resolution names (`mean_<label>`, `sigma_<label>_1`, `sigma_<label>_2`,
//!   `fr_<label>`) when they are present.
//! - Values are exchanged with the fitting layer as a dense `Array1<f64>`
//!   in set order ([`ParameterSet::values`], [`ParameterSet::apply_values`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter names are unique within a set.
//! - Every stored value is finite and within `[min, max]`; unbounded sides
//!   are `±∞`.
//! - Order is fixed at construction and never changes; indices handed out
//!   by [`ParameterSet::index_of`] stay valid for clones of the set.
use std::collections::HashMap;

use crate::spectrum::errors::{ModelError, ModelResult};
use ndarray::Array1;

/// Role of a resolution-model parameter attached to a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    Mean,
    Width1,
    Width2,
    Fraction,
}

/// Structured `(label, role)` key for a resolution parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamKey {
    pub label: String,
    pub role: ParamRole,
}

impl ParamKey {
    pub fn new(label: impl Into<String>, role: ParamRole) -> Self {
        Self { label: label.into(), role }
    }

    /// Conventional parameter name for this key.
    pub fn conventional_name(&self) -> String {
        match self.role {
            ParamRole::Mean => format!("mean_{}", self.label),
            ParamRole::Width1 => format!("sigma_{}_1", self.label),
            ParamRole::Width2 => format!("sigma_{}_2", self.label),
            ParamRole::Fraction => format!("fr_{}", self.label),
        }
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.conventional_name())
    }
}

/// A single model parameter.
///
/// `error` holds the symmetric (parabolic) uncertainty of the last fit and
/// `asym_error` the `(lower, upper)` MINOS interval when one was computed;
/// `lower` is negative or zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub constant: bool,
    pub error: Option<f64>,
    pub asym_error: Option<(f64, f64)>,
}

impl Parameter {
    /// Floating parameter with bounds `[min, max]` (either side may be infinite).
    ///
    /// # Errors
    /// - [`ModelError::InvalidBounds`] if `min >= max` or a bound is NaN.
    /// - [`ModelError::ValueOutsideBounds`] if `value` is non-finite or outside.
    pub fn new(name: impl Into<String>, value: f64, min: f64, max: f64) -> ModelResult<Self> {
        let name = name.into();
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(ModelError::InvalidBounds { name, min, max });
        }
        if !value.is_finite() || value < min || value > max {
            return Err(ModelError::ValueOutsideBounds { name, value, min, max });
        }
        Ok(Self { name, value, min, max, constant: false, error: None, asym_error: None })
    }

    /// Unbounded floating parameter.
    pub fn free(name: impl Into<String>, value: f64) -> ModelResult<Self> {
        Parameter::new(name, value, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Unbounded constant parameter.
    pub fn fixed(name: impl Into<String>, value: f64) -> ModelResult<Self> {
        let mut p = Parameter::free(name, value)?;
        p.constant = true;
        Ok(p)
    }

    /// Set the value, enforcing finiteness and bounds.
    pub fn set_value(&mut self, value: f64) -> ModelResult<()> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(ModelError::ValueOutsideBounds {
                name: self.name.clone(),
                value,
                min: self.min,
                max: self.max,
            });
        }
        self.value = value;
        Ok(())
    }

    pub fn has_lower(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper(&self) -> bool {
        self.max.is_finite()
    }

    /// `true` if `value` sits within `tol · scale` of a finite bound.
    pub fn at_limit(&self, tol: f64) -> bool {
        let scale = if self.has_lower() && self.has_upper() {
            self.max - self.min
        } else {
            self.value.abs().max(1.0)
        };
        (self.has_lower() && self.value - self.min <= tol * scale)
            || (self.has_upper() && self.max - self.value <= tol * scale)
    }
}

/// Ordered, name-unique collection of parameters with key bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    params: Vec<Parameter>,
    keys: HashMap<ParamKey, usize>,
}

impl ParameterSet {
    /// Build from a list of parameters.
    ///
    /// # Errors
    /// [`ModelError::DuplicateParameter`] if two parameters share a name.
    pub fn new(params: Vec<Parameter>) -> ModelResult<Self> {
        let mut set = ParameterSet::default();
        for p in params {
            set.push(p)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, param: Parameter) -> ModelResult<()> {
        if self.params.iter().any(|p| p.name == param.name) {
            return Err(ModelError::DuplicateParameter { name: param.name });
        }
        self.params.push(param);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Parameter> {
        self.params.iter_mut()
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    pub fn index_of(&self, name: &str) -> ModelResult<usize> {
        self.params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ModelError::MissingParameter { name: name.to_string() })
    }

    pub fn get(&self, name: &str) -> ModelResult<&Parameter> {
        let idx = self.index_of(name)?;
        Ok(&self.params[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> ModelResult<&mut Parameter> {
        let idx = self.index_of(name)?;
        Ok(&mut self.params[idx])
    }

    pub fn at(&self, index: usize) -> &Parameter {
        &self.params[index]
    }

    pub fn value(&self, name: &str) -> ModelResult<f64> {
        Ok(self.get(name)?.value)
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> ModelResult<()> {
        self.get_mut(name)?.set_value(value)
    }

    pub fn set_constant(&mut self, name: &str, constant: bool) -> ModelResult<()> {
        self.get_mut(name)?.constant = constant;
        Ok(())
    }

    /// Bind `key` to the existing parameter `name`.
    pub fn bind(&mut self, key: ParamKey, name: &str) -> ModelResult<()> {
        let idx = self.index_of(name)?;
        self.keys.insert(key, idx);
        Ok(())
    }

    /// Bind every conventional resolution name for `label` that exists in the set.
    pub fn tag_resolution(&mut self, label: &str) {
        for role in [ParamRole::Mean, ParamRole::Width1, ParamRole::Width2, ParamRole::Fraction] {
            let key = ParamKey::new(label, role);
            if let Ok(idx) = self.index_of(&key.conventional_name()) {
                self.keys.insert(key, idx);
            }
        }
    }

    /// Parameter bound to `key`.
    ///
    /// # Errors
    /// [`ModelError::MissingParameter`] naming the conventional name when the
    /// key is unbound.
    pub fn by_key(&self, key: &ParamKey) -> ModelResult<&Parameter> {
        self.keys
            .get(key)
            .map(|&idx| &self.params[idx])
            .ok_or_else(|| ModelError::MissingParameter { name: key.conventional_name() })
    }

    /// Current values in set order.
    pub fn values(&self) -> Array1<f64> {
        Array1::from_iter(self.params.iter().map(|p| p.value))
    }

    /// Overwrite all values from a dense vector in set order.
    ///
    /// # Errors
    /// - [`ModelError::ParamLengthMismatch`] on a length mismatch.
    /// - [`ModelError::ValueOutsideBounds`] for any rejected value; values
    ///   preceding the failure have already been written.
    pub fn apply_values(&mut self, values: &Array1<f64>) -> ModelResult<()> {
        if values.len() != self.params.len() {
            return Err(ModelError::ParamLengthMismatch {
                expected: self.params.len(),
                actual: values.len(),
            });
        }
        for (p, &v) in self.params.iter_mut().zip(values.iter()) {
            p.set_value(v)?;
        }
        Ok(())
    }

    /// Indices of floating (non-constant) parameters.
    pub fn free_indices(&self) -> Vec<usize> {
        self.params.iter().enumerate().filter(|(_, p)| !p.constant).map(|(i, _)| i).collect()
    }

    pub fn n_free(&self) -> usize {
        self.params.iter().filter(|p| !p.constant).count()
    }

    /// `(name, value)` pairs in set order.
    pub fn snapshot(&self) -> Vec<(String, f64)> {
        self.params.iter().map(|p| (p.name.clone(), p.value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Parameter construction/bounds checks.
    // - Name and key lookup (fail-fast on missing).
    // - Dense value exchange and free-index bookkeeping.
    // -------------------------------------------------------------------------

    fn resolution_set() -> ParameterSet {
        ParameterSet::new(vec![
            Parameter::new("mean_X", 5.25, 5.2, 5.3).unwrap(),
            Parameter::new("sigma_X_1", 0.01, 1e-4, 0.1).unwrap(),
            Parameter::new("sigma_X_2", 0.02, 1e-4, 0.1).unwrap(),
            Parameter::new("fr_X", 0.6, 0.0, 1.0).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn parameter_rejects_value_outside_bounds() {
        let err = Parameter::new("a", 2.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::ValueOutsideBounds { .. }));
        let err = Parameter::new("a", 0.5, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidBounds { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ParameterSet::new(vec![
            Parameter::free("a", 1.0).unwrap(),
            Parameter::free("a", 2.0).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err, ModelError::DuplicateParameter { name: "a".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Tagged keys resolve to the conventional names; unbound keys fail
    // with the conventional name in the error.
    //
    // Given
    // -----
    // - A set holding the four resolution parameters of label "X".
    //
    // Expect
    // ------
    // - `by_key(Fraction of X)` returns `fr_X`.
    // - `by_key(Mean of Y)` fails with `MissingParameter { "mean_Y" }`.
    fn tagged_keys_resolve_and_missing_keys_fail_fast() {
        // Arrange
        let mut set = resolution_set();

        // Act
        set.tag_resolution("X");

        // Assert
        let fr = set.by_key(&ParamKey::new("X", ParamRole::Fraction)).unwrap();
        assert_eq!(fr.name, "fr_X");
        let err = set.by_key(&ParamKey::new("Y", ParamRole::Mean)).unwrap_err();
        assert_eq!(err, ModelError::MissingParameter { name: "mean_Y".to_string() });
    }

    #[test]
    fn explicit_binding_overrides_naming_convention() {
        let mut set = resolution_set();
        set.bind(ParamKey::new("Z", ParamRole::Mean), "mean_X").unwrap();
        assert_relative_eq!(set.by_key(&ParamKey::new("Z", ParamRole::Mean)).unwrap().value, 5.25);
        assert!(set.bind(ParamKey::new("Z", ParamRole::Width1), "nope").is_err());
    }

    #[test]
    fn apply_values_and_free_indices() {
        let mut set = resolution_set();
        set.set_constant("sigma_X_2", true).unwrap();
        set.apply_values(&array![5.26, 0.011, 0.02, 0.5]).unwrap();
        assert_relative_eq!(set.value("mean_X").unwrap(), 5.26);
        assert_eq!(set.free_indices(), vec![0, 1, 3]);
        assert_eq!(set.n_free(), 3);
        assert!(set.apply_values(&array![1.0]).is_err());
    }

    #[test]
    fn at_limit_detects_boundary_values() {
        let p = Parameter::new("f", 1.0, 0.0, 1.0).unwrap();
        assert!(p.at_limit(1e-6));
        let q = Parameter::new("g", 0.5, 0.0, 1.0).unwrap();
        assert!(!q.at_limit(1e-6));
    }
}
