//! Error types shared by the model, controller and simulation crates.

use thiserror::Error;

/// Usage errors in parameter overrides or controller settings.
///
/// These are raised before any matrix math is attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A series override does not match the length of the others.
    #[error("parameter `{name}` has {actual} values, expected {expected} like the other series")]
    LengthMismatch {
        /// Offending parameter name.
        name: String,
        /// Length shared by the series seen first.
        expected: usize,
        /// Length of the offending series.
        actual: usize,
    },

    /// The name is not a parameter of the model.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// A series override with no values.
    #[error("parameter `{0}` is an empty series")]
    EmptySeries(String),

    /// A parameter required by the model is absent from the parameter set.
    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    /// A value outside its admissible domain.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue {
        /// Parameter or setting name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid value error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while forming or simulating the linear models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Bad overrides or settings.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The 2x2 mass matrix cannot be inverted.
    #[error("mass matrix is singular (determinant {0:e})")]
    SingularMassMatrix(f64),

    /// The ODE solver gave up.
    #[error("integration failed: {0}")]
    Integration(String),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, SimError>;
