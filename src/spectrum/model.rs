//! spectrum::model — the model interface consumed by the fitting engine.
//!
//! Purpose
//! -------
//! Define [`SpectrumModel`], the contract between the fit/statistics layers
//! and a parametric density over one observable. The engine only ever talks
//! to models through this trait: parameter access, density evaluation,
//! expected yields, likelihoods, and sampling.
//!
//! Key behaviors
//! -------------
//! - Required methods expose identity, parameters, component tags, and the
//!   normalized density `f(x; θ)` for an arbitrary parameter vector.
//! - Provided methods build on the density: Simpson bin integrals, the
//!   (extended, weighted) negative log-likelihood, and accept–reject
//!   sampling.
//!
//! Invariants & assumptions
//! ------------------------
//! - `pdf_values` is normalized to one over the observable range for every
//!   admissible parameter vector, and `component_densities` sums to it.
//! - Parameter vectors passed to evaluation methods are dense, in
//!   [`ParameterSet`] order, and have the same length as the set.
//! - Models are plain values: cloning yields a structurally independent copy.
//!
//! Conventions
//! -----------
//! - The NLL uses event weights raised to `weight_power`; power 1 is the
//!   ordinary weighted likelihood and power 2 feeds the weighted-data
//!   covariance correction.
//! - Densities below [`DENSITY_FLOOR`] are floored inside the NLL so that
//!   trial points outside a shape's support give a large finite penalty.
use crate::spectrum::{
    dataset::Dataset,
    errors::{ModelError, ModelResult},
    observable::Observable,
    params::ParameterSet,
};
use ndarray::Array1;
use rand::Rng;

/// Smallest density value entering a logarithm.
pub const DENSITY_FLOOR: f64 = 1e-300;

/// Simpson panels (even) per bin in [`SpectrumModel::bin_integrals`].
pub const SIMPSON_PANELS_PER_BIN: usize = 8;

/// Grid size used to bound the density for accept–reject sampling.
pub const SAMPLING_GRID: usize = 2048;

/// Give up accept–reject sampling after this many proposal batches.
pub const MAX_SAMPLING_ROUNDS: usize = 1000;

/// Class of a model component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentTag {
    Signal,
    Background,
    Other,
}

/// Name and tag of one model component, in model order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub name: String,
    pub tag: ComponentTag,
}

/// Parametric density over a single observable.
pub trait SpectrumModel: Clone + Send + Sync {
    // Required methods
    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);
    fn observable(&self) -> &Observable;
    fn parameters(&self) -> &ParameterSet;
    fn parameters_mut(&mut self) -> &mut ParameterSet;
    fn is_extendable(&self) -> bool;
    fn components(&self) -> Vec<ComponentInfo>;

    /// Normalized density at each `xs` for parameter vector `values`.
    fn pdf_values(&self, xs: &Array1<f64>, values: &Array1<f64>) -> ModelResult<Array1<f64>>;

    /// Per-component contributions (coefficient-scaled), in component order.
    fn component_densities(
        &self, xs: &Array1<f64>, values: &Array1<f64>,
    ) -> ModelResult<Vec<Array1<f64>>>;

    // Optional methods
    /// Expected number of events `ν(θ)`; only extended models implement it.
    fn expected_events(&self, _values: &Array1<f64>) -> ModelResult<f64> {
        Err(ModelError::NotExtendable { model: self.name().to_string() })
    }

    /// Probability content of each bin delimited by `edges`.
    fn bin_integrals(&self, edges: &Array1<f64>, values: &Array1<f64>) -> ModelResult<Array1<f64>> {
        if edges.len() < 2 {
            return Err(ModelError::InvalidBins { bins: 0 });
        }
        let n_bins = edges.len() - 1;
        let k = SIMPSON_PANELS_PER_BIN;
        let mut xs = Vec::with_capacity(n_bins * (k + 1));
        for b in 0..n_bins {
            let (a, c) = (edges[b], edges[b + 1]);
            let h = (c - a) / k as f64;
            xs.extend((0..=k).map(|j| if j == k { c } else { a + h * j as f64 }));
        }
        let dens = self.pdf_values(&Array1::from(xs), values)?;
        let mut out = Array1::zeros(n_bins);
        for b in 0..n_bins {
            let h = (edges[b + 1] - edges[b]) / k as f64;
            let seg = dens.slice(ndarray::s![b * (k + 1)..(b + 1) * (k + 1)]);
            let mut acc = seg[0] + seg[k];
            for j in 1..k {
                acc += if j % 2 == 1 { 4.0 * seg[j] } else { 2.0 * seg[j] };
            }
            out[b] = acc * h / 3.0;
        }
        Ok(out)
    }

    /// Negative log-likelihood of `data` at `values`.
    ///
    /// `−Σ wᵢᵖ ln f(xᵢ)`, plus `ν·Sₚ/S₁ − Sₚ ln ν` when `extended`, with
    /// `Sₚ = Σ wᵢᵖ`.
    ///
    /// # Errors
    /// - Density evaluation errors.
    /// - [`ModelError::NotExtendable`] for `extended = true` on a
    ///   non-extended model.
    /// - [`ModelError::InvalidExpectedEvents`] for a non-finite `ν`.
    fn nll(
        &self, values: &Array1<f64>, data: &Dataset, extended: bool, weight_power: i32,
    ) -> ModelResult<f64> {
        let dens = self.pdf_values(data.values(), values)?;
        let mut sum = 0.0;
        for (i, &f) in dens.iter().enumerate() {
            let w = data.weight(i).powi(weight_power);
            sum -= w * f.max(DENSITY_FLOOR).ln();
        }
        if extended {
            let nu = self.expected_events(values)?;
            if !nu.is_finite() {
                return Err(ModelError::InvalidExpectedEvents { value: nu });
            }
            let nu = nu.max(DENSITY_FLOOR);
            let s_p = data.sum_weights_pow(weight_power);
            let s_1 = data.sum_weights();
            let scale = if s_1 != 0.0 { s_p / s_1 } else { 1.0 };
            sum += nu * scale - s_p * nu.ln();
        }
        Ok(sum)
    }

    /// `ln L` of `data` at the current parameter values (extended when the
    /// model supports it).
    fn log_likelihood(&self, data: &Dataset) -> ModelResult<f64> {
        let values = self.parameters().values();
        Ok(-self.nll(&values, data, self.is_extendable(), 1)?)
    }

    /// Draw `n` unweighted events at the current parameter values.
    ///
    /// # Errors
    /// [`ModelError::SamplingFailed`] if the density cannot be bounded or too
    /// few proposals are accepted.
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> ModelResult<Dataset> {
        let obs = self.observable().clone();
        if n == 0 {
            return Dataset::new(obs, Array1::zeros(0));
        }
        let values = self.parameters().values();
        let grid = Array1::linspace(obs.min(), obs.max(), SAMPLING_GRID);
        let f_max = self.pdf_values(&grid, &values)?.fold(0.0_f64, |acc, &v| acc.max(v)) * 1.2;
        if !f_max.is_finite() || f_max <= 0.0 {
            return Err(ModelError::SamplingFailed {
                reason: format!("density bound {f_max} is not positive and finite"),
            });
        }
        let batch = (2 * n).max(64);
        let mut out = Vec::with_capacity(n);
        for _ in 0..MAX_SAMPLING_ROUNDS {
            let xs = Array1::from_iter((0..batch).map(|_| rng.gen_range(obs.min()..=obs.max())));
            let fx = self.pdf_values(&xs, &values)?;
            for (&x, &f) in xs.iter().zip(fx.iter()) {
                if rng.gen_range(0.0..f_max) < f {
                    out.push(x);
                    if out.len() == n {
                        return Dataset::new(obs, Array1::from(out));
                    }
                }
            }
        }
        Err(ModelError::SamplingFailed {
            reason: format!("accepted {} of {n} events", out.len()),
        })
    }
}
