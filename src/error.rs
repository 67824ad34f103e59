//! Error types for the market calibration toolkit

use thiserror::Error;

/// Result type alias for calibration operations
pub type Result<T> = std::result::Result<T, CalibrationError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum CalibrationError {
    /// Caller supplied a malformed CDF, quote ladder or outcome
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CalibrationError {
    /// Shorthand for the most common failure
    pub fn invalid(msg: impl Into<String>) -> Self {
        CalibrationError::InvalidInput(msg.into())
    }

    /// Whether this error describes a rejected forecast rather than an environment failure
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalibrationError::InvalidInput(_) | CalibrationError::InsufficientData(_)
        )
    }
}

impl From<polars::error::PolarsError> for CalibrationError {
    fn from(err: polars::error::PolarsError) -> Self {
        CalibrationError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CalibrationError {
    fn from(err: serde_json::Error) -> Self {
        CalibrationError::SerializationError(err.to_string())
    }
}
