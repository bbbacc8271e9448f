//! explorer::regions — signal and sideband windows from a resolution model.
//!
//! Purpose
//! -------
//! Derive the signal region (SR) and sideband region (SdR) of a resonance
//! from the three resolution parameters of its double-Gaussian shape, and
//! split datasets accordingly.
//!
//! Key behaviors
//! -------------
//! - `σ_eff = √(f·σ₁² + (1−f)·σ₂²)`, `window = n_window·σ_eff`,
//!   `distance = n_sideband·σ_eff`.
//! - SR = `{x : |x − mean| < window}`;
//!   SdR = `{x : window + distance < |x − mean| < 2·window + distance}`.
//! - Six boundary markers describe the regions for plotting.
//!
//! Invariants & assumptions
//! ------------------------
//! - All inequalities are strict, so SR and SdR are disjoint for any
//!   non-negative `distance`, and both are subsets of the input dataset.
//! - Region construction only reads parameters; the mean is supplied when
//!   a dataset is split, so the same [`Regions`] can be reused with a
//!   different (externally fixed) mean.
use crate::{
    explorer::errors::ExplorerResult,
    spectrum::{
        dataset::Dataset,
        errors::ModelResult,
        params::{ParamKey, ParamRole, Parameter, ParameterSet},
        shapes::effective_sigma,
    },
};

/// Resolved SR/SdR geometry for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Regions {
    pub label: String,
    pub sigma_eff: f64,
    pub window: f64,
    pub distance: f64,
}

/// Which boundary a [`RegionMarker`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Outer edge of the left sideband.
    LeftSidebandOuter,
    /// Inner edge of the left sideband.
    LeftSidebandInner,
    SignalLeft,
    SignalRight,
    /// Inner edge of the right sideband.
    RightSidebandInner,
    /// Outer edge of the right sideband.
    RightSidebandOuter,
}

/// Vertical marker at `x` drawn up to `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMarker {
    pub kind: MarkerKind,
    pub x: f64,
    pub height: f64,
}

/// Heights of the region markers, in the units of the plotted frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerHeights {
    pub sideband_left: f64,
    pub sideband_right: f64,
    pub signal: f64,
}

impl Regions {
    /// Regions for `label` from `fr_<label>`, `sigma_<label>_1` and
    /// `sigma_<label>_2`.
    ///
    /// # Errors
    /// `ExplorerError::MissingParameter` naming the first absent parameter.
    pub fn from_parameters(
        params: &ParameterSet, label: &str, n_window: f64, n_sideband: f64,
    ) -> ExplorerResult<Self> {
        let fraction = resolution_parameter(params, label, ParamRole::Fraction)?.value;
        let sigma1 = resolution_parameter(params, label, ParamRole::Width1)?.value;
        let sigma2 = resolution_parameter(params, label, ParamRole::Width2)?.value;
        let sigma_eff = effective_sigma(fraction, sigma1, sigma2);
        Ok(Self {
            label: label.to_string(),
            sigma_eff,
            window: n_window * sigma_eff,
            distance: n_sideband * sigma_eff,
        })
    }

    /// Current value of `mean_<label>` in `params`.
    ///
    /// # Errors
    /// `ExplorerError::MissingParameter` when the mean is absent.
    pub fn mean(&self, params: &ParameterSet) -> ExplorerResult<f64> {
        Ok(resolution_parameter(params, &self.label, ParamRole::Mean)?.value)
    }

    pub fn in_signal(&self, x: f64, mean: f64) -> bool {
        (x - mean).abs() < self.window
    }

    pub fn in_sideband(&self, x: f64, mean: f64) -> bool {
        let d = (x - mean).abs();
        d > self.window + self.distance && d < 2.0 * self.window + self.distance
    }

    /// `(SR, SdR)` subsets of `data`; either may be empty.
    pub fn split(&self, data: &Dataset, mean: f64) -> (Dataset, Dataset) {
        (data.reduce(|x| self.in_signal(x, mean)), data.reduce(|x| self.in_sideband(x, mean)))
    }

    /// Six boundary markers, left to right.
    pub fn markers(&self, mean: f64, heights: MarkerHeights) -> [RegionMarker; 6] {
        let (w, d) = (self.window, self.distance);
        let marker = |kind, x, height| RegionMarker { kind, x, height };
        [
            marker(MarkerKind::LeftSidebandOuter, mean - 2.0 * w - d, heights.sideband_left),
            marker(MarkerKind::LeftSidebandInner, mean - w - d, heights.sideband_left),
            marker(MarkerKind::SignalLeft, mean - w, heights.signal),
            marker(MarkerKind::SignalRight, mean + w, heights.signal),
            marker(MarkerKind::RightSidebandInner, mean + w + d, heights.sideband_right),
            marker(MarkerKind::RightSidebandOuter, mean + 2.0 * w + d, heights.sideband_right),
        ]
    }
}

// ---- Helper methods ----

/// Bound key if present, otherwise the conventional name.
fn resolution_parameter<'a>(
    params: &'a ParameterSet, label: &str, role: ParamRole,
) -> ModelResult<&'a Parameter> {
    let key = ParamKey::new(label, role);
    params.by_key(&key).or_else(|_| params.get(&key.conventional_name()))
}
