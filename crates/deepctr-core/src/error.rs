//! Error types for the DeepCTR core library.
//!
//! This module defines the errors raised while describing features and
//! laying them out, before any batch is processed.

use thiserror::Error;

/// The main error type for deepctr-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A feature descriptor of an unrecognized kind was supplied.
    #[error("Invalid feature column type: {kind}")]
    InvalidFeatureKind {
        /// The kind tag that was not recognized.
        kind: String,
    },

    /// A pooling combiner name that is not one of `sum`, `mean` or `max`.
    #[error("Invalid combiner: {combiner} (expected one of sum, mean, max)")]
    InvalidCombiner {
        /// The combiner name that was provided.
        combiner: String,
    },

    /// Error during configuration parsing or validation.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// A description of the configuration error.
        message: String,
    },

    /// Error when serialization or deserialization fails.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// A description of the serialization error.
        message: String,
    },
}

impl CoreError {
    /// Shorthand for building a [`CoreError::ConfigError`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
        }
    }
}

/// A specialized Result type for deepctr-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidFeatureKind {
            kind: "sequence".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid feature column type: sequence");

        let err = CoreError::InvalidCombiner {
            combiner: "median".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid combiner: median (expected one of sum, mean, max)"
        );

        let err = CoreError::config("vocabulary_size must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: vocabulary_size must be positive"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let parse = serde_json::from_str::<Vec<u32>>("[1,");
        let err: CoreError = parse.unwrap_err().into();
        assert!(matches!(err, CoreError::SerializationError { .. }));
    }
}
