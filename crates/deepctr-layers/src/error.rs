//! Error types for the deepctr-layers crate.
//!
//! This module defines error types for tensor manipulation, embedding lookup
//! and pooling, including shape mismatches and invalid indices.

use thiserror::Error;

/// Error type for layer operations.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Shape mismatch between expected and actual tensor shapes.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape
        expected: Vec<usize>,
        /// The actual shape that was provided
        actual: Vec<usize>,
    },

    /// Tensor has the wrong number of dimensions.
    #[error("Invalid rank: expected {expected}D tensor, got {actual}D")]
    InvalidRank {
        /// The expected number of dimensions
        expected: usize,
        /// The actual number of dimensions
        actual: usize,
    },

    /// A value that cannot be read as a non-negative integer index.
    #[error("Invalid index value: {value}")]
    InvalidIndex {
        /// The offending value
        value: f32,
    },

    /// An index outside of the embedding table.
    #[error("Index {index} out of range for vocabulary of size {vocabulary_size}")]
    IndexOutOfRange {
        /// The offending index
        index: usize,
        /// Number of rows in the table
        vocabulary_size: usize,
    },

    /// Error during weight initialization.
    #[error("Initialization error: {message}")]
    InitializationError {
        /// Description of the initialization error
        message: String,
    },

    /// Error during forward pass computation.
    #[error("Forward pass error: {message}")]
    ForwardError {
        /// Description of the forward pass error
        message: String,
    },
}

/// Result type alias for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;
