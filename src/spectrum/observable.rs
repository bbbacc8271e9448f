//! The fitted observable: a named variable with a closed range and a default
//! binning.
use crate::spectrum::errors::{ModelError, ModelResult};

/// A single real-valued observable (e.g. an invariant mass) with range
/// `[min, max]` and a bin count used whenever data are histogrammed.
#[derive(Debug, Clone, PartialEq)]
pub struct Observable {
    name: String,
    min: f64,
    max: f64,
    bins: usize,
}

impl Observable {
    /// Build a validated observable.
    ///
    /// # Errors
    /// - [`ModelError::InvalidRange`] if a bound is non-finite or `min >= max`.
    /// - [`ModelError::InvalidBins`] if `bins == 0`.
    pub fn new(name: impl Into<String>, min: f64, max: f64, bins: usize) -> ModelResult<Self> {
        let name = name.into();
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ModelError::InvalidRange { name, min, max });
        }
        if bins == 0 {
            return Err(ModelError::InvalidBins { bins });
        }
        Ok(Self { name, min, max, bins })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Range width `max - min`.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Closed-interval membership test.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }
}
