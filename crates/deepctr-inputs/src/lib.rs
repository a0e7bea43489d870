//! Embedding lookup and DNN input assembly for DeepCTR.
//!
//! Given feature descriptors from `deepctr-core`, this crate builds the
//! embedding tables and turns a flat input batch into the tensors a CTR
//! network consumes:
//!
//! - [`create_embedding_matrix`]: one table per distinct embedding name
//! - [`embedding_lookup`]: sparse lookups grouped by `group_name`
//! - [`get_varlen_pooling_list`]: masked pooling of variable-length features
//! - [`get_dense_input`]: dense value slicing
//! - [`combined_dnn_input`]: concatenation into one `[batch, width]` tensor
//! - [`InputEmbedder`]: all of the above behind a single type
//!
//! # Example
//!
//! ```
//! use deepctr_core::{Combiner, EmbeddingMatrixConfig, FeatureColumn, SparseFeat, VarLenSparseFeat};
//! use deepctr_inputs::InputEmbedder;
//! use deepctr_layers::Tensor;
//!
//! let columns: Vec<FeatureColumn> = vec![
//!     SparseFeat::new("item", 100, 8).unwrap().into(),
//!     VarLenSparseFeat::new(
//!         SparseFeat::builder("hist_item", 100)
//!             .embedding_dim(8)
//!             .embedding_name("item")
//!             .build()
//!             .unwrap(),
//!         4,
//!         Combiner::Mean,
//!         None,
//!     )
//!     .unwrap()
//!     .into(),
//! ];
//! let config = EmbeddingMatrixConfig::default().with_seed(1024);
//! let embedder = InputEmbedder::new(columns, &config).unwrap();
//! assert_eq!(embedder.embedding_dict().len(), 1);
//!
//! let x = Tensor::from_data(&[1, 5], vec![5.0, 1.0, 2.0, 0.0, 0.0]);
//! assert_eq!(embedder.dnn_input(&x).unwrap().shape(), &[1, 16]);
//! ```

#![warn(missing_docs)]

pub mod dnn_input;
pub mod embedder;
pub mod embedding_dict;
pub mod error;
pub mod lookup;

pub use dnn_input::combined_dnn_input;
pub use embedder::InputEmbedder;
pub use embedding_dict::{create_embedding_matrix, EmbeddingDict};
pub use error::{InputError, Result};
pub use lookup::{
    embedding_lookup, get_dense_input, get_varlen_pooling_list, lookup_sparse, slice_feature,
    varlen_embedding_lookup, GroupedEmbeddings,
};
