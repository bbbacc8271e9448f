//! explorer::errors — error kinds of the region partitioner, fit engine,
//! and bundle exporter.
//!
//! `ExplorerError` separates caller mistakes (`MissingParameter`,
//! `InvalidState`, `InvalidArgument`) from wrapped failures of the layers
//! below. Non-convergence is never an `ExplorerError`: fits report it in
//! their status codes.
use crate::{
    inference::errors::InferenceError, optimization::errors::OptError,
    spectrum::errors::ModelError, statistical_tests::errors::StatError,
};

pub type ExplorerResult<T> = Result<T, ExplorerError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerError {
    // ---- Caller errors ----
    /// A named parameter (or resolution key) is absent from the model.
    MissingParameter { name: String },
    /// The operation is not allowed in the explorer's current state.
    InvalidState { reason: String },
    /// An argument combination is invalid.
    InvalidArgument { reason: String },

    // ---- Wrapped ----
    Model(ModelError),
    Optimizer(OptError),
    Inference(InferenceError),
    Statistics(StatError),
}

impl ExplorerError {
    pub(crate) fn state(reason: impl Into<String>) -> Self {
        ExplorerError::InvalidState { reason: reason.into() }
    }

    pub(crate) fn argument(reason: impl Into<String>) -> Self {
        ExplorerError::InvalidArgument { reason: reason.into() }
    }
}

impl std::error::Error for ExplorerError {}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorerError::MissingParameter { name } => {
                write!(f, "Missing parameter '{name}' in model")
            }
            ExplorerError::InvalidState { reason } => write!(f, "Invalid state: {reason}"),
            ExplorerError::InvalidArgument { reason } => write!(f, "Invalid argument: {reason}"),
            ExplorerError::Model(err) => write!(f, "Model error: {err}"),
            ExplorerError::Optimizer(err) => write!(f, "Optimizer error: {err}"),
            ExplorerError::Inference(err) => write!(f, "{err}"),
            ExplorerError::Statistics(err) => write!(f, "Statistics error: {err}"),
        }
    }
}

impl From<ModelError> for ExplorerError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MissingParameter { name } => ExplorerError::MissingParameter { name },
            other => ExplorerError::Model(other),
        }
    }
}

impl From<OptError> for ExplorerError {
    fn from(err: OptError) -> Self {
        ExplorerError::Optimizer(err)
    }
}

impl From<InferenceError> for ExplorerError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Optimizer(inner) => ExplorerError::Optimizer(inner),
            other => ExplorerError::Inference(other),
        }
    }
}

impl From<StatError> for ExplorerError {
    fn from(err: StatError) -> Self {
        match err {
            StatError::Fit(inner) => *inner,
            StatError::Model(inner) => inner.into(),
            other => ExplorerError::Statistics(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Missing parameters surface as their own kind whatever layer raised them.
    // - Wrapped errors unwrap instead of nesting.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A model-level missing parameter becomes the explorer's own kind.
    //
    // Given
    // -----
    // - `ModelError::MissingParameter { name: "sigma_X_2" }`.
    //
    // Expect
    // ------
    // - `ExplorerError::MissingParameter` with the same name, also when the
    //   error first travelled through `StatError`.
    fn missing_parameter_is_lifted_from_model_errors() {
        // Arrange
        let model_err = ModelError::MissingParameter { name: "sigma_X_2".to_string() };

        // Act
        let direct: ExplorerError = model_err.clone().into();
        let via_stats: ExplorerError = StatError::Model(model_err).into();

        // Assert
        let expected = ExplorerError::MissingParameter { name: "sigma_X_2".to_string() };
        assert_eq!(direct, expected);
        assert_eq!(via_stats, expected);
    }

    #[test]
    fn boxed_fit_errors_are_unwrapped() {
        let inner = ExplorerError::state("not fitted");
        let err: ExplorerError = StatError::Fit(Box::new(inner.clone())).into();
        assert_eq!(err, inner);
        assert!(err.to_string().contains("not fitted"));
    }

    #[test]
    fn inference_optimizer_errors_are_flattened() {
        let err: ExplorerError =
            InferenceError::Optimizer(OptError::NonFiniteCost { value: f64::INFINITY }).into();
        assert!(matches!(err, ExplorerError::Optimizer(OptError::NonFiniteCost { .. })));
    }
}
