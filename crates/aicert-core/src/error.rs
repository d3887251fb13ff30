//! Error taxonomy for aicert.
//!
//! Input and configuration problems surface as [`CertError`] before any check
//! runs. Failures inside a single check are [`CheckError`]s and never escape
//! the runner. Model calls report [`ModelError`].

use crate::model::Capability;

/// Errors raised by a model when it is queried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model does not support {0}")]
    Unsupported(Capability),

    #[error("input has {actual} features, model expects {expected}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("model rejected input: {0}")]
    InvalidInput(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Errors produced while a single check executes.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("model returned {actual} outputs for {expected} rows")]
    OutputLength { expected: usize, actual: usize },

    #[error("feature index {index} out of range for width {width}")]
    FeatureIndex { index: usize, width: usize },

    #[error("{0}")]
    Other(String),
}

/// Input, configuration, and I/O errors.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("invalid check weight for '{name}': {weight} (must be finite and > 0)")]
    InvalidWeight { name: String, weight: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("unknown compliance standard: {0}")]
    UnknownStandard(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for aicert input-level operations.
pub type Result<T> = std::result::Result<T, CertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_weight_display() {
        let err = CertError::InvalidWeight {
            name: "Accuracy Validation".to_string(),
            weight: -1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Accuracy Validation"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn test_model_error_converts_into_check_error() {
        let err: CheckError = ModelError::Unsupported(Capability::Probabilities).into();
        assert!(err.to_string().contains("probability outputs"));
    }

    #[test]
    fn test_output_length_display() {
        let err = CheckError::OutputLength {
            expected: 10,
            actual: 9,
        };
        assert_eq!(err.to_string(), "model returned 9 outputs for 10 rows");
    }
}
