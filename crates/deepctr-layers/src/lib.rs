//! Tensor and embedding building blocks for DeepCTR.
//!
//! This crate provides the numeric pieces the input pipeline is assembled
//! from:
//!
//! - **Tensor**: a dense row-major `f32` array ([`Tensor`])
//! - **Embeddings**: `[vocabulary_size, dim]` lookup tables ([`Embedding`])
//! - **Initializers**: zero, constant and normal weight initialization
//! - **Sequence pooling**: masked sum / mean / max over embedded sequences
//! - **Merge**: concatenation of tensor lists along the feature axis
//!
//! # Example
//!
//! ```
//! use deepctr_core::Combiner;
//! use deepctr_layers::prelude::*;
//!
//! let mut table = Embedding::new(10, 2);
//! table.set_row(3, &[1.0, 0.0]).unwrap();
//! table.set_row(7, &[0.0, 1.0]).unwrap();
//!
//! let ids = Tensor::from_data(&[1, 4], vec![3.0, 7.0, 0.0, 0.0]);
//! let seq = table.forward(&ids).unwrap();
//! let mask = padding_mask(&ids).unwrap();
//! let pooled = SequencePoolingLayer::new(Combiner::Sum)
//!     .forward_with_mask(&seq, &mask)
//!     .unwrap();
//! assert_eq!(pooled.data(), &[1.0, 1.0]);
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod error;
pub mod initializer;
pub mod merge;
pub mod sequence;
pub mod tensor;

pub use embedding::{to_index, Embedding};
pub use error::{LayerError, LayerResult};
pub use initializer::{seeded_rng, Initializer};
pub use merge::{concat_fun, concat_last};
pub use sequence::{padding_mask, sequence_mask, SequencePoolingLayer};
pub use tensor::Tensor;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::embedding::{to_index, Embedding};
    pub use crate::error::{LayerError, LayerResult};
    pub use crate::initializer::{seeded_rng, Initializer};
    pub use crate::merge::{concat_fun, concat_last};
    pub use crate::sequence::{padding_mask, sequence_mask, SequencePoolingLayer};
    pub use crate::tensor::Tensor;
}
