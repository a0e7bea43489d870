//! The end-to-end input path of a CTR model.
//!
//! [`InputEmbedder`] owns the feature layout and the embedding tables built
//! from a list of descriptors, and turns a raw `[batch, total_width]` batch
//! into embedding and dense tensors or directly into the flat DNN input.

use std::collections::HashSet;

use deepctr_core::{
    build_input_features, dense_feature_columns, sparse_feature_columns,
    varlen_sparse_feature_columns, EmbeddingMatrixConfig, FeatureColumn, FeatureConfig,
    FeatureIndex,
};
use deepctr_layers::{LayerError, Tensor};

use crate::dnn_input::combined_dnn_input;
use crate::embedding_dict::{create_embedding_matrix, EmbeddingDict};
use crate::error::{InputError, Result};
use crate::lookup::{embedding_lookup, get_dense_input, get_varlen_pooling_list};

/// Layout plus embedding tables for a set of feature descriptors.
///
/// # Example
///
/// ```
/// use deepctr_core::{DenseFeat, EmbeddingMatrixConfig, FeatureColumn, SparseFeat};
/// use deepctr_inputs::InputEmbedder;
/// use deepctr_layers::Tensor;
///
/// let columns: Vec<FeatureColumn> = vec![
///     SparseFeat::new("gender", 2, 4).unwrap().into(),
///     DenseFeat::new("age", 1).unwrap().into(),
/// ];
/// let embedder = InputEmbedder::new(columns, &EmbeddingMatrixConfig::default()).unwrap();
///
/// let x = Tensor::from_data(&[1, 2], vec![1.0, 0.5]);
/// let out = embedder.dnn_input(&x).unwrap();
/// assert_eq!(out.shape(), &[1, 5]);
/// assert_eq!(embedder.compute_input_dim(true, true, false), 5);
/// ```
#[derive(Debug, Clone)]
pub struct InputEmbedder {
    columns: Vec<FeatureColumn>,
    index: FeatureIndex,
    embedding_dict: EmbeddingDict,
    linear: bool,
}

impl InputEmbedder {
    /// Builds the layout and the embedding tables for `columns`.
    ///
    /// Descriptors whose name is already taken by an earlier descriptor (or by
    /// an earlier length field) are dropped, matching the layout.
    pub fn new(mut columns: Vec<FeatureColumn>, config: &EmbeddingMatrixConfig) -> Result<Self> {
        let index = build_input_features(&columns);

        let mut seen = HashSet::new();
        columns.retain(|column| {
            if !seen.insert(column.name().to_string()) {
                return false;
            }
            if let Some(length_name) = column.as_varlen_sparse().and_then(|f| f.length_name()) {
                seen.insert(length_name.to_string());
            }
            true
        });

        let embedding_dict = create_embedding_matrix(&columns, config)?;
        tracing::debug!(
            features = columns.len(),
            tables = embedding_dict.len(),
            total_width = index.total_width(),
            "Built input embedder"
        );

        Ok(Self {
            columns,
            index,
            embedding_dict,
            linear: config.linear,
        })
    }

    /// Builds an embedder from a parsed configuration.
    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        Self::new(config.features.clone(), &config.embedding)
    }

    /// Returns the descriptors in layout order.
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Returns the feature layout.
    pub fn feature_index(&self) -> &FeatureIndex {
        &self.index
    }

    /// Returns the embedding tables.
    pub fn embedding_dict(&self) -> &EmbeddingDict {
        &self.embedding_dict
    }

    /// Returns the embedding tables for in-place updates.
    pub fn embedding_dict_mut(&mut self) -> &mut EmbeddingDict {
        &mut self.embedding_dict
    }

    /// Splits a batch into embedding tensors and dense values.
    ///
    /// The first list holds sparse embeddings (grouped, then flattened)
    /// followed by pooled variable-length embeddings, each `[batch, dim]`. The
    /// second list holds one `[batch, dimension]` tensor per dense feature.
    /// With `support_dense` false, any dense descriptor is an error.
    pub fn input_from_feature_columns(
        &self,
        x: &Tensor,
        support_dense: bool,
    ) -> Result<(Vec<Tensor>, Vec<Tensor>)> {
        self.check_batch(x)?;

        let dense_columns = dense_feature_columns(&self.columns);
        if !support_dense && !dense_columns.is_empty() {
            tracing::warn!(
                dense_features = dense_columns.len(),
                "Dense features given to an input that does not support them"
            );
            return Err(InputError::ConfigError {
                message: "dense features are not supported by this input".to_string(),
            });
        }

        let sparse_columns = sparse_feature_columns(&self.columns);
        let varlen_columns = varlen_sparse_feature_columns(&self.columns);

        let mut embeddings =
            embedding_lookup(x, &self.embedding_dict, &self.index, &sparse_columns, &[])?
                .into_list();
        embeddings.extend(get_varlen_pooling_list(
            &self.embedding_dict,
            x,
            &self.index,
            &varlen_columns,
        )?);
        let dense = get_dense_input(x, &self.index, &dense_columns)?;

        Ok((embeddings, dense))
    }

    /// Produces the flat `[batch, compute_input_dim(true, true, false)]` DNN input.
    pub fn dnn_input(&self, x: &Tensor) -> Result<Tensor> {
        let (embeddings, dense) = self.input_from_feature_columns(x, true)?;
        combined_dnn_input(&embeddings, &dense)
    }

    /// Returns the width of the DNN input built from the selected parts.
    ///
    /// The sparse part sums the table width of every sparse and
    /// variable-length feature, or counts those features when
    /// `feature_group` is set. The dense part sums dense dimensions.
    pub fn compute_input_dim(
        &self,
        include_sparse: bool,
        include_dense: bool,
        feature_group: bool,
    ) -> usize {
        let mut dim = 0;

        if include_sparse {
            let dims = sparse_feature_columns(&self.columns)
                .into_iter()
                .map(|f| f.embedding_dim())
                .chain(
                    varlen_sparse_feature_columns(&self.columns)
                        .into_iter()
                        .map(|f| f.embedding_dim()),
                );
            dim += if feature_group {
                dims.count()
            } else if self.linear {
                dims.map(|_| 1).sum::<usize>()
            } else {
                dims.sum::<usize>()
            };
        }

        if include_dense {
            dim += dense_feature_columns(&self.columns)
                .into_iter()
                .map(|f| f.dimension())
                .sum::<usize>();
        }

        dim
    }

    fn check_batch(&self, x: &Tensor) -> Result<()> {
        let width = self.index.total_width();
        if x.ndim() != 2 || x.shape()[1] != width {
            return Err(LayerError::ShapeMismatch {
                expected: vec![x.batch_size(), width],
                actual: x.shape().to_vec(),
            }
            .into());
        }
        Ok(())
    }
}
