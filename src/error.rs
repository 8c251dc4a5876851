use thiserror::Error;

/// Configuration problems detected before a fit starts.
///
/// None of these ever reach the solver loop: they are raised while the
/// measurement, parameter vector or solver bounds are being assembled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid bounds for parameter {name}: lower ({lower}) must be strictly less than upper ({upper})")]
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
    },

    #[error("Initial value {value} of parameter {name} is outside bounds [{lower}, {upper}]")]
    InitialOutsideBounds {
        name: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("Parameter {name} has a non-finite initial value")]
    NonFiniteInitial { name: String },

    #[error("Measurement contains no samples")]
    EmptyMeasurement,

    #[error("Sample {index} has non-positive or non-finite frequency {frequency} Hz")]
    InvalidFrequency { index: usize, frequency: f64 },

    #[error("Sample {index} has a non-finite impedance ({real}, {imag})")]
    NonFiniteImpedance { index: usize, real: f64, imag: f64 },

    #[error("Expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid solver setting: {0}")]
    InvalidSetting(String),
}

/// Error types for the eisfit-rs library.
#[derive(Error, Debug)]
pub enum EisFitError {
    /// Invalid fit configuration, raised before any residual evaluation.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Error indicating a mismatch in matrix or vector dimensions.
    #[error("Matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Malformed measurement file.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for eisfit-rs operations.
pub type Result<T> = std::result::Result<T, EisFitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EisFitError::DimensionMismatch("expected 10 residuals, got 8".to_string());
        assert!(format!("{}", err).contains("expected 10 residuals, got 8"));

        let err: EisFitError = ConfigurationError::InvalidBounds {
            name: "Rct".to_string(),
            lower: 5.0,
            upper: 1.0,
        }
        .into();
        let message = format!("{}", err);
        assert!(message.starts_with("Configuration error"));
        assert!(message.contains("Rct"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EisFitError = io_err.into();

        match err {
            EisFitError::IoError(_) => (),
            _ => panic!("Expected IoError variant"),
        }

        let err: EisFitError = ConfigurationError::EmptyMeasurement.into();
        assert!(matches!(
            err,
            EisFitError::Configuration(ConfigurationError::EmptyMeasurement)
        ));
    }
}
