//! Error types for configuration translation.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CodecError>;

/// Failures raised while translating between the canonical configuration and a vendor format.
///
/// None of these are retryable: every operation is local and deterministic, so the
/// caller has to change either the input or the target format.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The canonical configuration uses a feature the target format cannot express.
    #[error("{format} does not support {feature}")]
    UnsupportedSource {
        /// Name of the target format
        format: &'static str,
        /// The feature that has no representation
        feature: String,
    },

    /// No registered codec recognised the input text.
    #[error("Unrecognized configuration format")]
    UnrecognizedFormat,

    /// A recognised key carried a value that does not parse as its declared type.
    #[error("Malformed value for {key}: '{value}' is not a valid {expected}")]
    MalformedField {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// Script generation references a sample model that does not exist.
    #[error("Sample '{label}' references missing model '{model_path}'")]
    MissingModelReference { label: String, model_path: String },

    /// A `materialID` could not be found in the material library.
    #[error("Material '{0}' not found in material library")]
    UnknownMaterial(String),

    /// A full configuration was required but a section is absent.
    #[error("Configuration is missing the '{0}' section")]
    MissingSection(&'static str),

    /// A canonical value violates one of the model's invariants.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Shorthand for a synchrotron source exported to a cone-beam-only format.
    pub(crate) fn synchrotron_unsupported(format: &'static str) -> Self {
        Self::UnsupportedSource {
            format,
            feature: "synchrotron sources".to_string(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CodecError::synchrotron_unsupported("XTEKCT");
        assert_eq!(err.to_string(), "XTEKCT does not support synchrotron sources");

        let err = CodecError::MalformedField {
            key: "Projections".to_string(),
            value: "abc".to_string(),
            expected: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Malformed value for Projections: 'abc' is not a valid integer"
        );
    }
}
