//! Feature descriptors and feature layout for DeepCTR.
//!
//! This crate provides the configuration-time half of the input pipeline used
//! by CTR models:
//!
//! - **Feature descriptors**: [`SparseFeat`], [`DenseFeat`] and
//!   [`VarLenSparseFeat`], collected as [`FeatureColumn`]s.
//! - **Feature layout**: [`build_input_features`] assigns each feature a
//!   contiguous column range inside a flat input row.
//! - **Configuration**: [`EmbeddingMatrixConfig`] and JSON loading through
//!   [`FeatureConfig`].
//! - **Error types**: [`CoreError`].
//!
//! # Example
//!
//! ```
//! use deepctr_core::{build_input_features, Combiner, DenseFeat, FeatureColumn, SparseFeat, VarLenSparseFeat};
//!
//! let columns: Vec<FeatureColumn> = vec![
//!     SparseFeat::new("gender", 2, 4).unwrap().into(),
//!     DenseFeat::new("age", 1).unwrap().into(),
//!     VarLenSparseFeat::new(SparseFeat::new("hist", 100, 8).unwrap(), 5, Combiner::Sum, None)
//!         .unwrap()
//!         .into(),
//! ];
//!
//! let index = build_input_features(&columns);
//! assert_eq!(index.total_width(), 7);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod feature;
pub mod layout;
pub mod params;

pub use config::{parse_feature_columns, FeatureConfig};
pub use error::{CoreError, Result};
pub use feature::{
    dense_feature_columns, sparse_feature_columns, varlen_sparse_feature_columns, Combiner,
    DType, DenseFeat, EmbeddingDim, FeatureColumn, SparseFeat, SparseFeatBuilder,
    VarLenSparseFeat, DEFAULT_EMBEDDING_DIM, DEFAULT_GROUP_NAME,
};
pub use layout::{build_input_features, get_feature_names, FeatureIndex, FeatureRange};
pub use params::{EmbeddingMatrixConfig, DEFAULT_INIT_STD};
