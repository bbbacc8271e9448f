//! explorer::workspace — model bundles for hypothesis testing.
//!
//! Purpose
//! -------
//! Package a fitted model with its dataset and a statistical-model
//! descriptor (parameters of interest, observable, nuisance parameters,
//! best-fit snapshot), and unpack such a bundle into the signal+background
//! and background-only hypotheses used by the significance routines.
//!
//! Key behaviors
//! -------------
//! - [`ModelBundle::new`] stores independent copies of the data and model;
//!   later changes to the caller's objects never reach the bundle.
//! - [`extract`] returns `(data, s+b, b-only)`. The background-only model
//!   is a clone with the first POI set to zero and its own snapshot; the
//!   bundle itself is left unchanged.
//!
//! Conventions
//! -----------
//! - The first POI is the signal yield. This is a naming convention of the
//!   caller and is not checked beyond the parameter's existence.
use crate::{
    explorer::errors::{ExplorerError, ExplorerResult},
    spectrum::{dataset::Dataset, model::SpectrumModel},
};

/// Name given to the signal+background model by [`extract`].
pub const SB_MODEL_NAME: &str = "model_sb";

/// Name given to the background-only model by [`extract`].
pub const B_MODEL_NAME: &str = "B_only_model";

/// Descriptor of a statistical model.
#[derive(Debug, Clone, PartialEq)]
pub struct StatModelConfig {
    pub name: String,
    pub poi: Vec<String>,
    pub observable: String,
    pub nuisances: Vec<String>,
    /// `(name, value)` of each POI at the recorded point.
    pub snapshot: Vec<(String, f64)>,
}

impl StatModelConfig {
    /// The signal-yield POI.
    pub fn primary_poi(&self) -> &str {
        self.poi.first().map_or("", String::as_str)
    }
}

/// A model together with its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct StatModel<M: SpectrumModel> {
    pub config: StatModelConfig,
    pub model: M,
}

/// Data, fitted model, and descriptor, ready for significance tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBundle<M: SpectrumModel> {
    data: Dataset,
    model: M,
    config: StatModelConfig,
}

impl<M: SpectrumModel> ModelBundle<M> {
    /// Bundle copies of `data` and `model` with the given POI and nuisance
    /// names; the snapshot records the current POI values.
    ///
    /// # Errors
    /// - [`ExplorerError::InvalidArgument`] for an empty POI list.
    /// - [`ExplorerError::MissingParameter`] for an unknown name.
    pub fn new(
        data: &Dataset, model: &M, poi: &[&str], nuisances: &[&str],
    ) -> ExplorerResult<Self> {
        if poi.is_empty() {
            return Err(ExplorerError::argument("a model bundle needs at least one POI"));
        }
        let params = model.parameters();
        let snapshot = poi
            .iter()
            .map(|&name| -> ExplorerResult<(String, f64)> {
                Ok((name.to_string(), params.value(name)?))
            })
            .collect::<ExplorerResult<Vec<_>>>()?;
        for name in nuisances {
            params.index_of(name)?;
        }
        let config = StatModelConfig {
            name: SB_MODEL_NAME.to_string(),
            poi: poi.iter().map(|s| s.to_string()).collect(),
            observable: model.observable().name().to_string(),
            nuisances: nuisances.iter().map(|s| s.to_string()).collect(),
            snapshot,
        };
        Ok(Self { data: data.clone(), model: model.clone(), config })
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &StatModelConfig {
        &self.config
    }
}

/// `(data, s+b model, b-only model)` of a bundle.
///
/// # Errors
/// [`ExplorerError::Model`] if zero lies outside the POI's bounds.
pub fn extract<M: SpectrumModel>(
    bundle: &ModelBundle<M>,
) -> ExplorerResult<(Dataset, StatModel<M>, StatModel<M>)> {
    let poi = bundle.config.primary_poi();
    let mut sb = StatModel { config: bundle.config.clone(), model: bundle.model.clone() };
    sb.config.name = SB_MODEL_NAME.to_string();
    sb.model.set_name(SB_MODEL_NAME);

    let mut b = sb.clone();
    b.config.name = B_MODEL_NAME.to_string();
    b.model.set_name(B_MODEL_NAME);
    b.model.parameters_mut().set_value(poi, 0.0)?;
    for entry in b.config.snapshot.iter_mut() {
        if entry.0 == poi {
            entry.1 = 0.0;
        }
    }
    Ok((bundle.data.clone(), sb, b))
}
