use thiserror::Error;

/// Errors loading or slicing recorded experiment data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column `{column}` row {row}: cannot parse `{value}` as a number")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("column `{column}` has {actual} samples, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid perturbation config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
