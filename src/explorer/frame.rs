//! explorer::frame — numbers behind a fit plot.
//!
//! A [`Frame`] holds the binned data with error bars, the total model curve,
//! and one curve per signal or background component, all in candidates per
//! bin. Drawing is left to the caller.
use crate::{
    explorer::errors::{ExplorerError, ExplorerResult},
    spectrum::{
        dataset::Dataset,
        model::{ComponentTag, SpectrumModel},
    },
    statistical_tests::chi_square::garwood_interval,
};
use ndarray::Array1;

/// One binned data point; errors are distances below and above `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub err_lo: f64,
    pub err_hi: f64,
}

/// Model curve sampled on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub name: String,
    pub tag: ComponentTag,
    pub xs: Array1<f64>,
    pub ys: Array1<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub data: Vec<DataPoint>,
    pub model: Curve,
    pub components: Vec<Curve>,
}

/// Frame of `model` over `data` with curves sampled at `points` positions.
///
/// Data use the observable's binning; errors are Garwood intervals for
/// unweighted data and `√Σw²` otherwise. Curves are normalized to the
/// expected yield for extendable models and to the data sum otherwise.
///
/// # Errors
/// - [`ExplorerError::InvalidArgument`] for fewer than two curve points.
/// - Model evaluation failures.
pub fn build_frame<M: SpectrumModel>(
    model: &M, data: &Dataset, points: usize,
) -> ExplorerResult<Frame> {
    if points < 2 {
        return Err(ExplorerError::argument(format!(
            "a frame needs at least two curve points, got {points}"
        )));
    }
    let obs = model.observable();
    let hist = data.to_default_histogram()?;
    let width = hist.bin_width();

    let mut points_out = Vec::with_capacity(hist.bins());
    for ((&x, &y), &w2) in hist.centers().iter().zip(hist.counts().iter()).zip(hist.sumw2().iter())
    {
        let (err_lo, err_hi) = if hist.is_weighted() {
            (w2.sqrt(), w2.sqrt())
        } else {
            garwood_interval(y)?
        };
        points_out.push(DataPoint { x, y, err_lo, err_hi });
    }

    let values = model.parameters().values();
    let norm =
        if model.is_extendable() { model.expected_events(&values)? } else { data.sum_weights() };
    let scale = norm * width;
    let xs = Array1::linspace(obs.min(), obs.max(), points);
    let total = Curve {
        name: model.name().to_string(),
        tag: ComponentTag::Other,
        xs: xs.clone(),
        ys: model.pdf_values(&xs, &values)? * scale,
    };
    let components = model
        .components()
        .into_iter()
        .zip(model.component_densities(&xs, &values)?)
        .filter(|(info, _)| matches!(info.tag, ComponentTag::Signal | ComponentTag::Background))
        .map(|(info, dens)| Curve { name: info.name, tag: info.tag, xs: xs.clone(), ys: dens * scale })
        .collect();

    Ok(Frame {
        title: model.name().to_string(),
        x_title: obs.name().to_string(),
        y_title: format!("Candidates / {:.1} MeV", width * 1000.0),
        data: points_out,
        model: total,
        components,
    })
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
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Axis title, data errors (Garwood vs. √Σw²), curve normalization.
    // - Only tagged signal/background components get curves.
    // -------------------------------------------------------------------------

    fn model(extended: bool) -> CompositeModel {
        let obs = Observable::new("m", 5.2, 5.3, 50).unwrap();
        let mut params = vec![
            Parameter::fixed("mean_X", 5.25).unwrap(),
            Parameter::fixed("sigma_X", 0.01).unwrap(),
            Parameter::fixed("k", 0.0).unwrap(),
        ];
        let comps = vec![
            Component::signal("sig_X", Shape::Gaussian { mean: "mean_X".into(), sigma: "sigma_X".into() }),
            Component::background("bkgr", Shape::Exponential { slope: "k".into() }),
            Component::new("flat", ComponentTag::Other, Shape::Uniform),
        ];
        if extended {
            params.push(Parameter::fixed("n_sig", 100.0).unwrap());
            params.push(Parameter::fixed("n_bkg", 300.0).unwrap());
            params.push(Parameter::fixed("n_flat", 100.0).unwrap());
            let set = ParameterSet::new(params).unwrap();
            CompositeModel::extended("model", obs, set, comps, &["n_sig", "n_bkg", "n_flat"]).unwrap()
        } else {
            params.push(Parameter::fixed("f_sig", 0.2).unwrap());
            params.push(Parameter::fixed("f_bkg", 0.6).unwrap());
            let set = ParameterSet::new(params).unwrap();
            CompositeModel::fractions("model", obs, set, comps, &["f_sig", "f_bkg"]).unwrap()
        }
    }

    #[test]
    // Purpose
    // -------
    // Curves are in candidates per bin and the title carries the bin width.
    //
    // Given
    // -----
    // - An extended model with ν = 500 on [5.2, 5.3] in 50 bins (2 MeV).
    // - A flat 501-point grid.
    //
    // Expect
    // ------
    // - y title "Candidates / 2.0 MeV"; two component curves (signal and
    //   background, not "Other").
    // - The background curve is flat at 300·0.002/0.1 = 6 per bin.
    fn extended_curves_are_events_per_bin() {
        // Arrange
        let m = model(true);
        let obs = m.observable().clone();
        let data = Dataset::new(obs, array![5.21, 5.25, 5.25, 5.29]).unwrap();

        // Act
        let frame = build_frame(&m, &data, 501).unwrap();

        // Assert
        assert_eq!(frame.y_title, "Candidates / 2.0 MeV");
        assert_eq!(frame.data.len(), 50);
        assert_eq!(frame.components.len(), 2);
        assert_eq!(frame.components[1].tag, ComponentTag::Background);
        assert_relative_eq!(frame.components[1].ys[250], 6.0, max_relative = 1e-9);
        let sum: f64 = frame.components.iter().map(|c| c.ys[250]).sum();
        assert!(frame.model.ys[250] > sum);
    }

    #[test]
    fn unweighted_points_use_garwood_errors() {
        let m = model(false);
        let data = Dataset::new(m.observable().clone(), array![5.251, 5.251, 5.251, 5.251]).unwrap();

        let frame = build_frame(&m, &data, 11).unwrap();

        let filled: Vec<&DataPoint> = frame.data.iter().filter(|p| p.y > 0.0).collect();
        assert_eq!(filled.len(), 1);
        assert_relative_eq!(filled[0].err_lo, 1.914, epsilon = 1e-2);
        assert_relative_eq!(filled[0].err_hi, 3.162, epsilon = 1e-2);
        let empty = frame.data.iter().find(|p| p.y == 0.0).unwrap();
        assert_eq!(empty.err_lo, 0.0);
    }

    #[test]
    fn weighted_points_use_sum_w2_and_curve_uses_data_sum() {
        let m = model(false);
        let data = Dataset::with_weights(
            m.observable().clone(),
            array![5.251, 5.251],
            array![2.0, 3.0],
        )
        .unwrap();

        let frame = build_frame(&m, &data, 11).unwrap();

        let point = frame.data.iter().find(|p| p.y > 0.0).unwrap();
        assert_relative_eq!(point.y, 5.0);
        assert_relative_eq!(point.err_lo, 13.0_f64.sqrt(), max_relative = 1e-12);
        // Background fraction 0.6 of a total of 5, flat over 0.1 in 2 MeV bins.
        assert_relative_eq!(frame.components[1].ys[5], 0.6 * 5.0 * 0.02, max_relative = 1e-9);
    }

    #[test]
    fn too_few_points_is_invalid() {
        let m = model(true);
        let data = Dataset::new(m.observable().clone(), array![5.25]).unwrap();
        assert!(matches!(build_frame(&m, &data, 1), Err(ExplorerError::InvalidArgument { .. })));
    }
}
