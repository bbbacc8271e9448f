//! spectrum::errors — error surface for observables, datasets, and models.
//!
//! Purpose
//! -------
//! Collect every failure that can occur while building observables and
//! datasets, looking up parameters, or evaluating/sampling a spectrum model
//! into a single enum, [`ModelError`], with the alias [`ModelResult<T>`].
//!
//! Conventions
//! -----------
//! - Variants carry the offending name/value so messages are useful on
//!   their own.
//! - Missing named parameters always surface as
//!   [`ModelError::MissingParameter`]; higher layers map this variant onto
//!   their own "missing parameter" kind without losing the name.

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Observable ----
    /// Observable range must be finite with `min < max`.
    InvalidRange {
        name: String,
        min: f64,
        max: f64,
    },
    /// Bin counts must be positive.
    InvalidBins {
        bins: usize,
    },

    // ---- Dataset ----
    /// Observed values must be finite.
    NonFiniteValue {
        index: usize,
        value: f64,
    },
    /// Observed values must lie inside the observable range.
    ValueOutOfRange {
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Weight vector length must match the number of values.
    WeightLengthMismatch {
        expected: usize,
        found: usize,
    },
    /// Event weights must be finite.
    InvalidWeight {
        index: usize,
        value: f64,
    },
    /// The dataset has no entries (or zero total weight).
    EmptyDataset,

    // ---- Parameters ----
    /// Named parameter (or key) is not part of the parameter set.
    MissingParameter {
        name: String,
    },
    /// Two parameters share the same name.
    DuplicateParameter {
        name: String,
    },
    /// Parameter bounds must satisfy `min < max`.
    InvalidBounds {
        name: String,
        min: f64,
        max: f64,
    },
    /// Parameter value is non-finite or outside its bounds.
    ValueOutsideBounds {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Parameter vector length does not match the parameter set.
    ParamLengthMismatch {
        expected: usize,
        actual: usize,
    },

    // ---- Model ----
    /// Model structure is inconsistent (component/coefficient counts, names).
    InvalidComposition {
        reason: String,
    },
    /// Shape parameters outside their domain (e.g. non-positive width).
    InvalidShape {
        component: String,
        reason: &'static str,
    },
    /// Density normalization over the observable range failed.
    NormalizationFailed {
        component: String,
        value: f64,
    },
    /// Expected event count requested from a non-extended model.
    NotExtendable {
        model: String,
    },
    /// Expected number of events must be finite and positive.
    InvalidExpectedEvents {
        value: f64,
    },
    /// Accept–reject sampling failed to produce the requested events.
    SamplingFailed {
        reason: String,
    },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Observable ----
            ModelError::InvalidRange { name, min, max } => {
                write!(f, "Invalid range for observable '{name}': [{min}, {max}]")
            }
            ModelError::InvalidBins { bins } => {
                write!(f, "Invalid bin count {bins}: must be positive")
            }

            // ---- Dataset ----
            ModelError::NonFiniteValue { index, value } => {
                write!(f, "Non-finite value at index {index}: {value}")
            }
            ModelError::ValueOutOfRange { index, value, min, max } => {
                write!(f, "Value at index {index} ({value}) outside observable range [{min}, {max}]")
            }
            ModelError::WeightLengthMismatch { expected, found } => {
                write!(f, "Weight length mismatch: expected {expected}, found {found}")
            }
            ModelError::InvalidWeight { index, value } => {
                write!(f, "Invalid weight at index {index}: {value}, must be finite")
            }
            ModelError::EmptyDataset => write!(f, "Dataset is empty"),

            // ---- Parameters ----
            ModelError::MissingParameter { name } => {
                write!(f, "Missing parameter '{name}'")
            }
            ModelError::DuplicateParameter { name } => {
                write!(f, "Duplicate parameter '{name}'")
            }
            ModelError::InvalidBounds { name, min, max } => {
                write!(f, "Invalid bounds for '{name}': [{min}, {max}]")
            }
            ModelError::ValueOutsideBounds { name, value, min, max } => {
                write!(f, "Value {value} for '{name}' outside bounds [{min}, {max}]")
            }
            ModelError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, actual {actual}")
            }

            // ---- Model ----
            ModelError::InvalidComposition { reason } => {
                write!(f, "Invalid model composition: {reason}")
            }
            ModelError::InvalidShape { component, reason } => {
                write!(f, "Invalid shape in component '{component}': {reason}")
            }
            ModelError::NormalizationFailed { component, value } => {
                write!(f, "Normalization of component '{component}' failed: integral = {value}")
            }
            ModelError::NotExtendable { model } => {
                write!(f, "Model '{model}' is not extendable")
            }
            ModelError::InvalidExpectedEvents { value } => {
                write!(f, "Invalid expected number of events: {value}")
            }
            ModelError::SamplingFailed { reason } => {
                write!(f, "Sampling failed: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Display messages embed their payloads so errors are self-describing.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Missing-parameter messages must name the parameter.
    //
    // Given
    // -----
    // - `MissingParameter { name: "fr_X" }`.
    //
    // Expect
    // ------
    // - The rendered message contains `fr_X`.
    fn missing_parameter_message_names_parameter() {
        // Arrange
        let err = ModelError::MissingParameter { name: "fr_X".to_string() };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("fr_X"), "message was: {msg}");
    }

    #[test]
    fn out_of_range_message_embeds_bounds() {
        let err = ModelError::ValueOutOfRange { index: 3, value: 5.4, min: 5.2, max: 5.3 };
        let msg = err.to_string();
        assert!(msg.contains("5.4") && msg.contains("5.2") && msg.contains("index 3"));
    }
}
