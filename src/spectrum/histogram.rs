//! Fixed-width binned view of a dataset.
//!
//! Each bin keeps the sum of weights and the sum of squared weights so that
//! both Poisson and weighted (`Σw²`) error models can be built on top of it.
//! The upper range edge is folded into the last bin.
use crate::spectrum::errors::{ModelError, ModelResult};
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    lo: f64,
    hi: f64,
    counts: Array1<f64>,
    sumw2: Array1<f64>,
    weighted: bool,
}

impl Histogram {
    /// Empty histogram with `bins` equal-width bins on `[lo, hi]`.
    ///
    /// # Errors
    /// - [`ModelError::InvalidBins`] for `bins == 0`.
    /// - [`ModelError::InvalidRange`] for a non-finite or inverted range.
    pub fn new(lo: f64, hi: f64, bins: usize) -> ModelResult<Self> {
        if bins == 0 {
            return Err(ModelError::InvalidBins { bins });
        }
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(ModelError::InvalidRange { name: "histogram".to_string(), min: lo, max: hi });
        }
        Ok(Self {
            lo,
            hi,
            counts: Array1::zeros(bins),
            sumw2: Array1::zeros(bins),
            weighted: false,
        })
    }

    /// Add an entry with weight `w`. Entries outside `[lo, hi]` are ignored.
    pub fn fill(&mut self, x: f64, w: f64) {
        if let Some(b) = self.find_bin(x) {
            self.counts[b] += w;
            self.sumw2[b] += w * w;
            if w != 1.0 {
                self.weighted = true;
            }
        }
    }

    /// Bin index for `x`, or `None` outside the range.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.lo && x <= self.hi) {
            return None;
        }
        let n = self.bins();
        let idx = ((x - self.lo) / self.bin_width()).floor() as usize;
        Some(idx.min(n - 1))
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.bins() as f64
    }

    /// `bins + 1` bin edges from `lo` to `hi`.
    pub fn edges(&self) -> Array1<f64> {
        let w = self.bin_width();
        let n = self.bins();
        Array1::from_iter((0..=n).map(|i| if i == n { self.hi } else { self.lo + w * i as f64 }))
    }

    pub fn centers(&self) -> Array1<f64> {
        let w = self.bin_width();
        Array1::from_iter((0..self.bins()).map(|i| self.lo + w * (i as f64 + 0.5)))
    }

    /// Sum of weights per bin.
    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    /// Sum of squared weights per bin.
    pub fn sumw2(&self) -> &Array1<f64> {
        &self.sumw2
    }

    /// Total sum of weights.
    pub fn total(&self) -> f64 {
        self.counts.sum()
    }

    /// `true` once any entry with a weight different from one was filled.
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }
}
