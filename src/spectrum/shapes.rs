//! Density shapes normalized over a finite observable range `[lo, hi]`.
//!
//! Each [`Shape`] names its parameters; the composite model resolves those
//! names to positions in its parameter set once and passes the values in
//! [`Shape::param_names`] order to [`Shape::density`].
use crate::spectrum::errors::{ModelError, ModelResult};
use ndarray::Array1;
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// Simpson panels used for the ARGUS normalization integral.
const ARGUS_PANELS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Truncated Gaussian.
    Gaussian { mean: String, sigma: String },
    /// Two truncated Gaussians with a common mean; `fraction` weights the first.
    DoubleGaussian { mean: String, sigma1: String, sigma2: String, fraction: String },
    /// `exp(slope · x)`.
    Exponential { slope: String },
    /// ARGUS background `m·√(1−(m/m0)²)·exp(c·(1−(m/m0)²))`, zero above `m0`.
    Argus { endpoint: String, curvature: String },
    /// Flat density.
    Uniform,
}

impl Shape {
    /// Parameter names in the order expected by [`Shape::density`].
    pub fn param_names(&self) -> Vec<&str> {
        match self {
            Shape::Gaussian { mean, sigma } => vec![mean.as_str(), sigma.as_str()],
            Shape::DoubleGaussian { mean, sigma1, sigma2, fraction } => {
                vec![mean.as_str(), sigma1.as_str(), sigma2.as_str(), fraction.as_str()]
            }
            Shape::Exponential { slope } => vec![slope.as_str()],
            Shape::Argus { endpoint, curvature } => vec![endpoint.as_str(), curvature.as_str()],
            Shape::Uniform => vec![],
        }
    }

    /// Normalized density at `xs`.
    ///
    /// # Errors
    /// - [`ModelError::InvalidShape`] for parameters outside the shape's domain.
    /// - [`ModelError::NormalizationFailed`] when the range integral is not
    ///   positive and finite.
    pub fn density(
        &self, component: &str, xs: &Array1<f64>, p: &[f64], lo: f64, hi: f64,
    ) -> ModelResult<Array1<f64>> {
        match self {
            Shape::Gaussian { .. } => gaussian(component, xs, p[0], p[1], lo, hi),
            Shape::DoubleGaussian { .. } => {
                let fr = p[3];
                let g1 = gaussian(component, xs, p[0], p[1], lo, hi)?;
                let g2 = gaussian(component, xs, p[0], p[2], lo, hi)?;
                Ok(g1 * fr + g2 * (1.0 - fr))
            }
            Shape::Exponential { .. } => exponential(component, xs, p[0], lo, hi),
            Shape::Argus { .. } => argus(component, xs, p[0], p[1], lo, hi),
            Shape::Uniform => Ok(Array1::from_elem(xs.len(), 1.0 / (hi - lo))),
        }
    }
}

/// Effective width of a two-Gaussian mixture with a common mean.
pub fn effective_sigma(fraction: f64, sigma1: f64, sigma2: f64) -> f64 {
    (fraction * sigma1 * sigma1 + (1.0 - fraction) * sigma2 * sigma2).sqrt()
}

fn gaussian(
    component: &str, xs: &Array1<f64>, mean: f64, sigma: f64, lo: f64, hi: f64,
) -> ModelResult<Array1<f64>> {
    if !(sigma > 0.0) || !sigma.is_finite() || !mean.is_finite() {
        return Err(ModelError::InvalidShape {
            component: component.to_string(),
            reason: "Gaussian width must be positive and finite.",
        });
    }
    let z = 0.5 * (erfc((lo - mean) / (sigma * SQRT_2)) - erfc((hi - mean) / (sigma * SQRT_2)));
    if !(z > 0.0) {
        return Err(ModelError::NormalizationFailed { component: component.to_string(), value: z });
    }
    let scale = 1.0 / (sigma * (2.0 * PI).sqrt() * z);
    Ok(xs.mapv(|x| {
        let t = (x - mean) / sigma;
        scale * (-0.5 * t * t).exp()
    }))
}

fn exponential(
    component: &str, xs: &Array1<f64>, slope: f64, lo: f64, hi: f64,
) -> ModelResult<Array1<f64>> {
    if !slope.is_finite() {
        return Err(ModelError::InvalidShape {
            component: component.to_string(),
            reason: "Exponential slope must be finite.",
        });
    }
    let width = hi - lo;
    if (slope * width).abs() < 1e-12 {
        return Ok(Array1::from_elem(xs.len(), 1.0 / width));
    }
    // Anchor at the end where the exponential is largest to avoid overflow.
    let (anchor, norm) = if slope < 0.0 {
        (lo, (slope * width).exp_m1() / slope)
    } else {
        (hi, -(-slope * width).exp_m1() / slope)
    };
    if !(norm > 0.0) || !norm.is_finite() {
        return Err(ModelError::NormalizationFailed {
            component: component.to_string(),
            value: norm,
        });
    }
    Ok(xs.mapv(|x| (slope * (x - anchor)).exp() / norm))
}

fn argus(
    component: &str, xs: &Array1<f64>, m0: f64, c: f64, lo: f64, hi: f64,
) -> ModelResult<Array1<f64>> {
    if !m0.is_finite() || !c.is_finite() || m0 <= lo || lo < 0.0 {
        return Err(ModelError::InvalidShape {
            component: component.to_string(),
            reason: "ARGUS needs finite parameters and 0 <= lo < m0.",
        });
    }
    let u = |m: f64| 1.0 - (m / m0) * (m / m0);
    let t_hi = u(lo).max(0.0).sqrt();
    let t_lo = u(hi.min(m0)).max(0.0).sqrt();
    let integral = m0 * m0 * simpson(|t| t * t * (c * t * t).exp(), t_lo, t_hi, ARGUS_PANELS);
    if !(integral > 0.0) || !integral.is_finite() {
        return Err(ModelError::NormalizationFailed {
            component: component.to_string(),
            value: integral,
        });
    }
    Ok(xs.mapv(|m| {
        let um = u(m);
        if um <= 0.0 { 0.0 } else { m * um.sqrt() * (c * um).exp() / integral }
    }))
}

/// Composite Simpson rule with an even number of panels.
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, panels: usize) -> f64 {
    let n = panels + panels % 2;
    let h = (b - a) / n as f64;
    let mut acc = f(a) + f(b);
    for j in 1..n {
        let x = a + h * j as f64;
        acc += if j % 2 == 1 { 4.0 * f(x) } else { 2.0 * f(x) };
    }
    acc * h / 3.0
}
