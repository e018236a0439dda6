use simcore::ConfigurationError;
use thiserror::Error;

/// Errors loading a parameter set from disk.
#[derive(Debug, Error)]
pub enum ParameterSetError {
    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameter file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
