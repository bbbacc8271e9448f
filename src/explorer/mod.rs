//! explorer — region partitioning, fitting, and bundle export for one
//! labelled resonance.
//!
//! Purpose
//! -------
//! Tie a [`Dataset`] and a [`SpectrumModel`] together under a label and
//! drive the analysis steps on them: signal/sideband regions, the
//! four-pass likelihood and χ² fit protocols (with MINOS), goodness of
//! fit, plot data, and the export of a [`ModelBundle`] for significance
//! tests.
//!
//! Key behaviors
//! -------------
//! - [`DataExplorer`] is the stateful façade. Its fits are destructive: the
//!   fitted values are written into the explorer's own model and the
//!   instance is marked as fitted.
//! - The free functions ([`fit_likelihood`], [`fit_chi2`], [`minos_interval`],
//!   [`build_frame`], [`extract`]) are pure and can be used without the
//!   façade.
//!
//! Invariants & assumptions
//! ------------------------
//! - Regions are only served before any fit: the resonance mean must be an
//!   externally fixed value, not one fitted to the data being partitioned.
//! - Goodness-of-fit tests and bundle export require a completed fit.
//! - Non-convergence is reported through status codes and warnings, never
//!   as an error.
//!
//! Conventions
//! -----------
//! - Resolution parameters are looked up through [`ParamKey`]s with the
//!   conventional names `mean_<label>`, `sigma_<label>_1`,
//!   `sigma_<label>_2`, `fr_<label>`.
//! - Goodness-of-fit outcomes are stored per label in a [`Chi2Summary`].
//!
//! Downstream usage
//! ----------------
//! ```rust,ignore
//! let mut ex = DataExplorer::new("X", data, model)?;
//! ex.set_regions(3.0, 2.0)?;
//! let (sr, sdr) = ex.get_regions()?;
//! ex.fit(false, &["sigma_X_1"])?;
//! let gof = ex.chi2_test(None, 0.05)?;
//! let bundle = ex.prepare_workspace(&["n_sig"], &["n_bkg", "k"])?;
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests per submodule; the façade's state machine is tested here
//!   and the full pipeline in `tests/integration_spectrum_pipeline.rs`.
//!
//! [`ParamKey`]: crate::spectrum::params::ParamKey

pub mod errors;
pub mod fit;
pub mod frame;
pub mod minos;
pub mod objective;
pub mod options;
pub mod regions;
pub mod results;
pub mod workspace;

use std::collections::BTreeMap;

use crate::{
    spectrum::{dataset::Dataset, model::SpectrumModel},
    statistical_tests::chi_square::{Chi2TestOutcome, chi_square_test},
};

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{ExplorerError, ExplorerResult};
pub use self::fit::{NllMinimum, fit_chi2, fit_likelihood, minimize_nll};
pub use self::frame::{Curve, DataPoint, Frame, build_frame};
pub use self::minos::minos_interval;
pub use self::options::{ExplorerOptions, MinosOptions};
pub use self::regions::{MarkerHeights, MarkerKind, RegionMarker, Regions};
pub use self::results::{Chi2FitOutcome, FitResult, FitWarning, MinosError, PassReport};
pub use self::workspace::{ModelBundle, StatModel, StatModelConfig, extract};

/// Goodness-of-fit outcomes keyed by label.
pub type Chi2Summary = BTreeMap<String, Chi2TestOutcome>;

/// DataExplorer — analysis state of one labelled resonance.
///
/// Holds the dataset, the model (mutated by fits), the region geometry, and
/// the latest fit records.
#[derive(Debug, Clone)]
pub struct DataExplorer<M: SpectrumModel> {
    label: String,
    data: Dataset,
    model: M,
    options: ExplorerOptions,
    regions: Option<Regions>,
    is_fitted: bool,
    n_floated: usize,
    last_fit: Option<FitResult>,
    last_chi2: Option<Chi2FitOutcome>,
    chi2_summary: Chi2Summary,
}

impl<M: SpectrumModel> DataExplorer<M> {
    /// # Errors
    /// [`ExplorerError::InvalidArgument`] when the dataset and the model are
    /// defined on different observables.
    pub fn new(label: impl Into<String>, data: Dataset, model: M) -> ExplorerResult<Self> {
        if data.observable() != model.observable() {
            return Err(ExplorerError::argument(format!(
                "dataset observable '{}' differs from model observable '{}'",
                data.observable().name(),
                model.observable().name()
            )));
        }
        Ok(Self {
            label: label.into(),
            data,
            model,
            options: ExplorerOptions::default(),
            regions: None,
            is_fitted: false,
            n_floated: 0,
            last_fit: None,
            last_chi2: None,
            chi2_summary: Chi2Summary::new(),
        })
    }

    pub fn with_options(mut self, options: ExplorerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the model; clears the stored regions.
    pub fn model_mut(&mut self) -> &mut M {
        self.regions = None;
        &mut self.model
    }

    pub fn options(&self) -> &ExplorerOptions {
        &self.options
    }

    pub fn regions(&self) -> Option<&Regions> {
        self.regions.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn last_fit(&self) -> Option<&FitResult> {
        self.last_fit.as_ref()
    }

    pub fn last_chi2(&self) -> Option<&Chi2FitOutcome> {
        self.last_chi2.as_ref()
    }

    pub fn chi2_summary(&self) -> &Chi2Summary {
        &self.chi2_summary
    }

    /// Compute and store the region geometry from the resolution parameters.
    ///
    /// # Errors
    /// [`ExplorerError::MissingParameter`] if `fr_<label>`,
    /// `sigma_<label>_1` or `sigma_<label>_2` is absent.
    pub fn set_regions(&mut self, n_window: f64, n_sideband: f64) -> ExplorerResult<&Regions> {
        let regions =
            Regions::from_parameters(self.model.parameters(), &self.label, n_window, n_sideband)?;
        Ok(self.regions.insert(regions))
    }

    /// `(SR, SdR)` subsets of the dataset around `mean_<label>`.
    ///
    /// # Errors
    /// - [`ExplorerError::InvalidState`] after a fit, or before
    ///   [`set_regions`](Self::set_regions).
    /// - [`ExplorerError::MissingParameter`] if `mean_<label>` is absent.
    pub fn get_regions(&self) -> ExplorerResult<(Dataset, Dataset)> {
        if self.is_fitted {
            return Err(ExplorerError::state("regions undefined on a data-fitted mean"));
        }
        let regions = self.defined_regions()?;
        let mean = regions.mean(self.model.parameters())?;
        Ok(regions.split(&self.data, mean))
    }

    /// Boundary markers of the stored regions around `mean_<label>`.
    ///
    /// # Errors
    /// As [`get_regions`](Self::get_regions), except that fitted instances
    /// are allowed.
    pub fn region_markers(&self, heights: MarkerHeights) -> ExplorerResult<[RegionMarker; 6]> {
        let regions = self.defined_regions()?;
        Ok(regions.markers(regions.mean(self.model.parameters())?, heights))
    }

    /// Likelihood fit with the four-pass protocol; `fix` is held constant in
    /// pass 2 only. The fitted values are written into the model.
    ///
    /// # Errors
    /// As [`fit_likelihood`].
    pub fn fit(&mut self, is_sum_w2: bool, fix: &[&str]) -> ExplorerResult<&FitResult> {
        let result = fit_likelihood(&self.model, &self.data, fix, is_sum_w2, &self.options.fit)?;
        result.apply_to(self.model.parameters_mut())?;
        self.is_fitted = true;
        self.n_floated = result.floating().len();
        Ok(self.last_fit.insert(result))
    }

    /// Binned χ² fit with the four-pass protocol and, with `minos`, a
    /// profile interval for `poi`. The fitted values are written into the
    /// model.
    ///
    /// # Errors
    /// - [`ExplorerError::InvalidArgument`] if `minos` is set without `poi`.
    /// - As [`fit_chi2`].
    pub fn chi2_fit(
        &mut self, fix: &[&str], minos: bool, poi: Option<&str>,
    ) -> ExplorerResult<&Chi2FitOutcome> {
        if minos && poi.is_none() {
            return Err(ExplorerError::argument("MINOS requested without a parameter of interest"));
        }
        let outcome = fit_chi2(
            &self.model,
            &self.data,
            fix,
            if minos { poi } else { None },
            self.options.bin_errors,
            &self.options.chi2,
            &self.options.minos,
        )?;
        outcome.apply_to(self.model.parameters_mut())?;
        self.is_fitted = true;
        self.n_floated = outcome.n_free();
        Ok(self.last_chi2.insert(outcome))
    }

    /// Goodness of fit of the fitted model, stored under the label.
    ///
    /// `bins` overrides the observable's bin count; the degrees of freedom
    /// subtract the parameters floated by the latest fit.
    ///
    /// # Errors
    /// - [`ExplorerError::InvalidState`] before any fit.
    /// - [`ExplorerError::Statistics`] for invalid `bins`/`alpha` or too few
    ///   used bins.
    pub fn chi2_test(&mut self, bins: Option<usize>, alpha: f64) -> ExplorerResult<Chi2TestOutcome> {
        if !self.is_fitted {
            return Err(ExplorerError::state("goodness of fit requires a completed fit"));
        }
        let outcome = chi_square_test(
            &self.model,
            &self.data,
            bins,
            self.options.gof_errors,
            self.n_floated,
            alpha,
        )?;
        self.chi2_summary.insert(self.label.clone(), outcome);
        Ok(outcome)
    }

    /// Plot data of the current model over the dataset.
    ///
    /// # Errors
    /// As [`build_frame`].
    pub fn frame(&self, points: usize) -> ExplorerResult<Frame> {
        build_frame(&self.model, &self.data, points)
    }

    /// Bundle of the fitted model and the dataset for significance tests.
    ///
    /// # Errors
    /// - [`ExplorerError::InvalidState`] before any fit.
    /// - As [`ModelBundle::new`].
    pub fn prepare_workspace(
        &self, poi: &[&str], nuisances: &[&str],
    ) -> ExplorerResult<ModelBundle<M>> {
        if !self.is_fitted {
            return Err(ExplorerError::state("a model bundle requires a completed fit"));
        }
        ModelBundle::new(&self.data, &self.model, poi, nuisances)
    }

    fn defined_regions(&self) -> ExplorerResult<&Regions> {
        self.regions
            .as_ref()
            .ok_or_else(|| ExplorerError::state("regions are not set; call set_regions first"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{
        composite::{Component, CompositeModel},
        observable::Observable,
        params::{Parameter, ParameterSet},
        shapes::Shape,
    };
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - State machine of the façade: regions before fits, fit side effects,
    //   goodness of fit and export only after a fit.
    // - Argument checks (observable mismatch, MINOS without POI).
    // -------------------------------------------------------------------------

    fn model() -> CompositeModel {
        let obs = Observable::new("m", 5.2, 5.3, 50).unwrap();
        let params = ParameterSet::new(vec![
            Parameter::new("n_sig", 300.0, 0.0, 1e4).unwrap(),
            Parameter::new("n_bkg", 700.0, 0.0, 1e5).unwrap(),
            Parameter::fixed("mean_X", 5.25).unwrap(),
            Parameter::fixed("fr_X", 0.7).unwrap(),
            Parameter::fixed("sigma_X_1", 0.004).unwrap(),
            Parameter::fixed("sigma_X_2", 0.01).unwrap(),
            Parameter::new("k", -10.0, -100.0, 100.0).unwrap(),
        ])
        .unwrap();
        CompositeModel::extended(
            "model",
            obs,
            params,
            vec![
                Component::signal(
                    "sig_X",
                    Shape::DoubleGaussian {
                        mean: "mean_X".into(),
                        sigma1: "sigma_X_1".into(),
                        sigma2: "sigma_X_2".into(),
                        fraction: "fr_X".into(),
                    },
                ),
                Component::background("bkgr", Shape::Exponential { slope: "k".into() }),
            ],
            &["n_sig", "n_bkg"],
        )
        .unwrap()
    }

    fn explorer() -> DataExplorer<CompositeModel> {
        let m = model();
        let data = m.sample(1000, &mut StdRng::seed_from_u64(5)).unwrap();
        DataExplorer::new("X", data, m).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Regions are served before a fit and refused afterwards.
    //
    // Given
    // -----
    // - A sampled dataset, regions (3σ window, 2σ distance).
    //
    // Expect
    // ------
    // - Before fitting: non-empty SR, identical results on repeated calls.
    // - After `fit`: InvalidState, model parameters updated, fitted flag set.
    fn regions_are_refused_after_fit() {
        // Arrange
        let mut ex = explorer();
        ex.set_regions(3.0, 2.0).unwrap();

        // Act
        let first = ex.get_regions().unwrap();
        let second = ex.get_regions().unwrap();
        let n_sig_before = ex.model().parameters().value("n_sig").unwrap();
        ex.fit(false, &[]).unwrap();

        // Assert
        assert!(!first.0.is_empty());
        assert_eq!(first, second);
        assert!(ex.is_fitted());
        assert!(matches!(ex.get_regions(), Err(ExplorerError::InvalidState { .. })));
        assert_ne!(ex.model().parameters().value("n_sig").unwrap(), n_sig_before);
        assert!(ex.model().parameters().get("n_sig").unwrap().error.is_some());
        assert!(ex.region_markers(MarkerHeights {
            sideband_left: 1.0,
            sideband_right: 1.0,
            signal: 2.0
        })
        .is_ok());
    }

    #[test]
    fn get_regions_requires_set_regions() {
        let ex = explorer();
        assert!(matches!(ex.get_regions(), Err(ExplorerError::InvalidState { .. })));
    }

    #[test]
    fn model_mutation_clears_regions() {
        let mut ex = explorer();
        ex.set_regions(3.0, 2.0).unwrap();
        ex.model_mut().parameters_mut().set_value("sigma_X_1", 0.005).unwrap();
        assert!(ex.regions().is_none());
    }

    #[test]
    fn gof_and_export_require_a_fit() {
        let mut ex = explorer();
        assert!(matches!(ex.chi2_test(None, 0.05), Err(ExplorerError::InvalidState { .. })));
        assert!(matches!(
            ex.prepare_workspace(&["n_sig"], &[]),
            Err(ExplorerError::InvalidState { .. })
        ));
    }

    #[test]
    fn minos_without_poi_fails_before_fitting() {
        let mut ex = explorer();
        let err = ex.chi2_fit(&[], true, None).unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidArgument { .. }));
        assert!(!ex.is_fitted());
    }

    #[test]
    // Purpose
    // -------
    // After a χ² fit the goodness-of-fit test subtracts the floated
    // parameters and stores its outcome under the label.
    //
    // Given
    // -----
    // - The sampled dataset; χ² fit with MINOS on n_sig.
    //
    // Expect
    // ------
    // - ndf = used bins − 3 (n_sig, n_bkg, k floated).
    // - A MINOS interval with lower < 0 < upper on n_sig.
    // - The summary contains label "X"; export succeeds.
    fn chi2_fit_then_gof_and_export() {
        let mut ex = explorer();

        let outcome = ex.chi2_fit(&[], true, Some("n_sig")).unwrap().clone();
        let gof = ex.chi2_test(None, 0.01).unwrap();

        let minos = outcome.minos.unwrap();
        assert!(minos.lower < 0.0 && minos.upper > 0.0);
        assert_eq!(gof.ndf(), gof.used_bins() - 3);
        assert!(ex.chi2_summary().contains_key("X"));
        let bundle = ex.prepare_workspace(&["n_sig"], &["n_bkg", "k"]).unwrap();
        assert_eq!(bundle.config().poi, vec!["n_sig".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // Explorer options reach the χ² fit: a larger MINOS `up` widens the
    // interval.
    //
    // Given
    // -----
    // - Two explorers on the same sample; one with `up = 2` (2σ on χ²/2).
    //
    // Expect
    // ------
    // - The 2σ upper error is roughly twice the 1σ one.
    fn options_reach_the_minos_scan() {
        // Arrange
        let mut narrow = explorer();
        let options = ExplorerOptions {
            minos: MinosOptions::new(2.0, 1e-3, 60).unwrap(),
            ..ExplorerOptions::default()
        };
        let mut wide = explorer().with_options(options);

        // Act
        let one = narrow.chi2_fit(&[], true, Some("n_sig")).unwrap().minos.clone().unwrap();
        let two = wide.chi2_fit(&[], true, Some("n_sig")).unwrap().minos.clone().unwrap();

        // Assert
        assert_eq!(wide.options().minos.up, 2.0);
        assert!(two.upper > 1.6 * one.upper && two.upper < 2.4 * one.upper);
    }

    #[test]
    fn observable_mismatch_is_rejected() {
        let m = model();
        let other = Observable::new("m", 5.0, 5.5, 50).unwrap();
        let data = Dataset::new(other, ndarray::array![5.1]).unwrap();
        assert!(matches!(
            DataExplorer::new("X", data, m),
            Err(ExplorerError::InvalidArgument { .. })
        ));
    }
}
