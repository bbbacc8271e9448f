//! spectrum — observables, datasets, parameters, and spectrum models.
//!
//! Purpose
//! -------
//! Provide the shared data and model abstractions that the fit engine,
//! region partitioner, statistics, and bundle exporter build on: a single
//! [`Observable`] with a fixed range and binning, (weighted) [`Dataset`]s
//! with subsetting and histogramming, named bounded [`Parameter`]s with
//! structured [`ParamKey`] lookups, and the [`SpectrumModel`] trait with a
//! concrete tagged-component implementation ([`CompositeModel`]).
//!
//! Key behaviors
//! -------------
//! - Validate observables and data once at construction so downstream code
//!   can assume finite, in-range values.
//! - Evaluate normalized densities, bin integrals, (extended, weighted)
//!   negative log-likelihoods, and draw accept–reject samples.
//! - Fail fast with [`ModelError::MissingParameter`] whenever a named
//!   parameter or key is absent.
//!
//! Invariants & assumptions
//! ------------------------
//! - Models are values: cloning a model (or a [`ParameterSet`]) yields an
//!   independent copy with no shared mutable state.
//! - Parameter vectors exchanged with the optimizer are dense, in set order.
//!
//! Conventions
//! -----------
//! - Observable ranges are closed intervals; the histogram folds the upper
//!   edge into the last bin.
//! - Component classes are explicit [`ComponentTag`]s.
//!
//! Downstream usage
//! ----------------
//! - `explorer` reads resolution parameters through [`ParamKey`]s, fits
//!   models through [`SpectrumModel::nll`] and [`SpectrumModel::bin_integrals`],
//!   and clones models when exporting bundles.
//! - `statistical_tests` samples toys through [`SpectrumModel::sample`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction guards, normalization of every shape,
//!   component bookkeeping, the extended NLL term, and seeded sampling.

pub mod composite;
pub mod dataset;
pub mod errors;
pub mod histogram;
pub mod model;
pub mod observable;
pub mod params;
pub mod shapes;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::composite::{Component, CompositeModel};
pub use self::dataset::Dataset;
pub use self::errors::{ModelError, ModelResult};
pub use self::histogram::Histogram;
pub use self::model::{ComponentInfo, ComponentTag, SpectrumModel};
pub use self::observable::Observable;
pub use self::params::{ParamKey, ParamRole, Parameter, ParameterSet};
pub use self::shapes::{Shape, effective_sigma};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use spectrum_explorer::spectrum::prelude::*;
//
// to import the data/model surface in a single line.

pub mod prelude {
    pub use super::composite::{Component, CompositeModel};
    pub use super::dataset::Dataset;
    pub use super::errors::{ModelError, ModelResult};
    pub use super::model::{ComponentTag, SpectrumModel};
    pub use super::observable::Observable;
    pub use super::params::{ParamKey, ParamRole, Parameter, ParameterSet};
    pub use super::shapes::Shape;
}
