//! spectrum::dataset — (optionally weighted) unbinned observations.
//!
//! Purpose
//! -------
//! Hold the observed values of an [`Observable`] together with optional
//! per-event weights, and provide the two derived views the engine needs:
//! predicate-based subsetting ([`Dataset::reduce`]) and fixed binning
//! ([`Dataset::to_histogram`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Every stored value is finite and lies inside the observable range;
//!   construction fails otherwise, and `reduce` can only remove entries.
//! - When present, weights have the same length as the values and are
//!   finite.
//! - Order of entries is preserved by every operation.
use crate::spectrum::{
    errors::{ModelError, ModelResult},
    histogram::Histogram,
    observable::Observable,
};
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    observable: Observable,
    values: Array1<f64>,
    weights: Option<Array1<f64>>,
}

impl Dataset {
    /// Unweighted dataset.
    ///
    /// # Errors
    /// - [`ModelError::NonFiniteValue`] for NaN/±∞ entries.
    /// - [`ModelError::ValueOutOfRange`] for entries outside the observable range.
    pub fn new(observable: Observable, values: Array1<f64>) -> ModelResult<Self> {
        validate_values(&observable, &values)?;
        Ok(Self { observable, values, weights: None })
    }

    /// Weighted dataset; weights must match the values one-to-one.
    ///
    /// # Errors
    /// Same as [`Dataset::new`], plus [`ModelError::WeightLengthMismatch`] and
    /// [`ModelError::InvalidWeight`].
    pub fn with_weights(
        observable: Observable, values: Array1<f64>, weights: Array1<f64>,
    ) -> ModelResult<Self> {
        validate_values(&observable, &values)?;
        if weights.len() != values.len() {
            return Err(ModelError::WeightLengthMismatch {
                expected: values.len(),
                found: weights.len(),
            });
        }
        if let Some((index, &value)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite()) {
            return Err(ModelError::InvalidWeight { index, value });
        }
        Ok(Self { observable, values, weights: Some(weights) })
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    /// Number of entries (not the sum of weights).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Weight of entry `i` (one for unweighted data).
    pub fn weight(&self, i: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// `(value, weight)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().enumerate().map(move |(i, &x)| (x, self.weight(i)))
    }

    pub fn sum_weights(&self) -> f64 {
        self.weights.as_ref().map_or(self.values.len() as f64, |w| w.sum())
    }

    pub fn sum_weights_sq(&self) -> f64 {
        self.weights.as_ref().map_or(self.values.len() as f64, |w| w.mapv(|v| v * v).sum())
    }

    /// `Σ wᵢᵖ` for the weight power used by the likelihood.
    pub fn sum_weights_pow(&self, power: i32) -> f64 {
        match power {
            1 => self.sum_weights(),
            2 => self.sum_weights_sq(),
            p => self.iter().map(|(_, w)| w.powi(p)).sum(),
        }
    }

    /// Subset of entries for which `pred(value)` holds, weights carried along.
    pub fn reduce<P: Fn(f64) -> bool>(&self, pred: P) -> Dataset {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| pred(self.values[i])).collect();
        let values = Array1::from_iter(keep.iter().map(|&i| self.values[i]));
        let weights =
            self.weights.as_ref().map(|w| Array1::from_iter(keep.iter().map(|&i| w[i])));
        Dataset { observable: self.observable.clone(), values, weights }
    }

    /// Histogram over the observable range with `bins` bins.
    ///
    /// # Errors
    /// [`ModelError::InvalidBins`] if `bins == 0`.
    pub fn to_histogram(&self, bins: usize) -> ModelResult<Histogram> {
        let mut hist = Histogram::new(self.observable.min(), self.observable.max(), bins)?;
        for (x, w) in self.iter() {
            hist.fill(x, w);
        }
        Ok(hist)
    }

    /// Histogram using the observable's own bin count.
    pub fn to_default_histogram(&self) -> ModelResult<Histogram> {
        self.to_histogram(self.observable.bins())
    }
}

fn validate_values(observable: &Observable, values: &Array1<f64>) -> ModelResult<()> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(ModelError::NonFiniteValue { index, value });
        }
        if !observable.contains(value) {
            return Err(ModelError::ValueOutOfRange {
                index,
                value,
                min: observable.min(),
                max: observable.max(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Construction guards, reduce semantics (order, weights), and histogram
    // materialization. Region-level partitioning is tested in `explorer`.
    // -------------------------------------------------------------------------

    fn mass() -> Observable {
        Observable::new("m", 5.2, 5.3, 10).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Values outside the declared range are rejected at construction.
    //
    // Given
    // -----
    // - Observable on [5.2, 5.3] and a value 5.31.
    //
    // Expect
    // ------
    // - `ValueOutOfRange` with the offending index.
    fn rejects_out_of_range_values() {
        // Arrange
        let values = array![5.21, 5.31];

        // Act
        let err = Dataset::new(mass(), values).unwrap_err();

        // Assert
        assert!(matches!(err, ModelError::ValueOutOfRange { index: 1, .. }));
    }

    #[test]
    fn rejects_weight_length_mismatch() {
        let err = Dataset::with_weights(mass(), array![5.21, 5.22], array![1.0]).unwrap_err();
        assert_eq!(err, ModelError::WeightLengthMismatch { expected: 2, found: 1 });
    }

    #[test]
    // Purpose
    // -------
    // `reduce` keeps order and carries the matching weights.
    //
    // Given
    // -----
    // - Weighted dataset [5.21, 5.25, 5.29] with weights [1, 2, 3].
    //
    // Expect
    // ------
    // - Keeping x > 5.22 yields [5.25, 5.29] with weights [2, 3].
    fn reduce_preserves_order_and_weights() {
        // Arrange
        let ds =
            Dataset::with_weights(mass(), array![5.21, 5.25, 5.29], array![1.0, 2.0, 3.0]).unwrap();

        // Act
        let sub = ds.reduce(|x| x > 5.22);

        // Assert
        assert_eq!(sub.values(), &array![5.25, 5.29]);
        assert_eq!(sub.weights(), Some(&array![2.0, 3.0]));
        assert_relative_eq!(sub.sum_weights(), 5.0);
        assert_relative_eq!(sub.sum_weights_sq(), 13.0);
    }

    #[test]
    fn reduce_to_nothing_is_empty_not_error() {
        let ds = Dataset::new(mass(), array![5.21, 5.25]).unwrap();
        let sub = ds.reduce(|_| false);
        assert!(sub.is_empty());
        assert_eq!(sub.observable(), ds.observable());
    }

    #[test]
    fn histogram_counts_every_entry_including_max() {
        let ds = Dataset::new(mass(), array![5.2, 5.255, 5.3]).unwrap();
        let h = ds.to_default_histogram().unwrap();
        assert_eq!(h.bins(), 10);
        assert_relative_eq!(h.total(), 3.0);
        assert_relative_eq!(h.counts()[9], 1.0);
        assert_relative_eq!(h.counts()[5], 1.0);
    }
}
