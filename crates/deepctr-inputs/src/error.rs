//! Error types for the deepctr-inputs crate.

use deepctr_core::CoreError;
use deepctr_layers::LayerError;
use thiserror::Error;

/// Error type for building and running the input pipeline.
#[derive(Debug, Error)]
pub enum InputError {
    /// A feature requested hashing on the fly, which is not supported.
    #[error("Feature hashing on the fly is not supported (feature `{name}`)")]
    UnsupportedFeature {
        /// The feature that requested hashing.
        name: String,
    },

    /// Neither sparse embeddings nor dense values were supplied.
    #[error("No sparse embeddings or dense values to assemble")]
    NoInput,

    /// A feature has no range in the feature index.
    #[error("Feature `{name}` is not in the feature index")]
    MissingFeature {
        /// The missing feature name.
        name: String,
    },

    /// A feature refers to an embedding table that does not exist.
    #[error("Embedding table `{name}` does not exist")]
    MissingEmbedding {
        /// The missing embedding name.
        name: String,
    },

    /// Inconsistent configuration detected while building the pipeline.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// A description of the configuration error.
        message: String,
    },

    /// Error from the descriptor / layout layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from tensor, embedding or pooling operations.
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Result type alias for input pipeline operations.
pub type Result<T> = std::result::Result<T, InputError>;
