//! Embedding lookup, variable-length pooling and dense slicing over a flat
//! input batch.
//!
//! Every function here takes the batch `x` as a `[batch, total_width]` tensor
//! and a [`FeatureIndex`] telling it where each feature lives.

use deepctr_core::{DenseFeat, FeatureIndex, SparseFeat, VarLenSparseFeat};
use deepctr_layers::{padding_mask, SequencePoolingLayer, Tensor};

use crate::embedding_dict::EmbeddingDict;
use crate::error::{InputError, Result};

/// Embedding outputs grouped by `group_name`.
///
/// Groups keep first-insertion order and tensors within a group keep
/// descriptor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedEmbeddings {
    groups: Vec<(String, Vec<Tensor>)>,
}

impl GroupedEmbeddings {
    /// Creates an empty grouping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `tensor` to `group`, creating the group if needed.
    pub fn push(&mut self, group: &str, tensor: Tensor) {
        match self.groups.iter_mut().find(|(name, _)| name == group) {
            Some((_, tensors)) => tensors.push(tensor),
            None => self.groups.push((group.to_string(), vec![tensor])),
        }
    }

    /// Returns the tensors of `group`.
    pub fn get(&self, group: &str) -> Option<&[Tensor]> {
        self.groups
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, tensors)| tensors.as_slice())
    }

    /// Returns the group names in insertion order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates `(group, tensors)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Tensor])> {
        self.groups
            .iter()
            .map(|(name, tensors)| (name.as_str(), tensors.as_slice()))
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no embedding was collected.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Flattens every group into one list, group by group.
    pub fn into_list(self) -> Vec<Tensor> {
        self.groups
            .into_iter()
            .flat_map(|(_, tensors)| tensors)
            .collect()
    }
}

/// Copies the columns of feature `name` out of `x`.
pub fn slice_feature(x: &Tensor, index: &FeatureIndex, name: &str) -> Result<Tensor> {
    let range = index.get(name).ok_or_else(|| InputError::MissingFeature {
        name: name.to_string(),
    })?;
    Ok(x.narrow_columns(range.as_range())?)
}

fn reject_hashing(name: &str, use_hash: bool) -> Result<()> {
    if use_hash {
        return Err(InputError::UnsupportedFeature {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Looks up one sparse feature, returning a `[batch, dim]` tensor.
pub fn lookup_sparse(
    x: &Tensor,
    dict: &EmbeddingDict,
    index: &FeatureIndex,
    feat: &SparseFeat,
) -> Result<Tensor> {
    reject_hashing(feat.name(), feat.use_hash())?;
    let ids = slice_feature(x, index, feat.name())?;
    let table = dict.table(feat.embedding_name())?;
    // [batch, 1, dim] -> [batch, dim]
    Ok(table.forward(&ids)?.flatten_from(1))
}

/// Looks up sparse features and groups the results by `group_name`.
///
/// When `return_feat_list` is non-empty only the named features are looked
/// up.
///
/// # Example
///
/// ```
/// use deepctr_core::{build_input_features, EmbeddingMatrixConfig, FeatureColumn, SparseFeat};
/// use deepctr_inputs::{create_embedding_matrix, embedding_lookup};
/// use deepctr_layers::Tensor;
///
/// let columns: Vec<FeatureColumn> = vec![
///     SparseFeat::new("user", 10, 4).unwrap().into(),
///     SparseFeat::builder("item", 10).group_name("item_side").build().unwrap().into(),
/// ];
/// let index = build_input_features(&columns);
/// let dict = create_embedding_matrix(&columns, &EmbeddingMatrixConfig::default()).unwrap();
/// let sparse: Vec<&SparseFeat> = columns.iter().filter_map(|c| c.as_sparse()).collect();
///
/// let x = Tensor::from_data(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]);
/// let grouped = embedding_lookup(&x, &dict, &index, &sparse, &[]).unwrap();
/// assert_eq!(grouped.group_names().collect::<Vec<_>>(), vec!["default_group", "item_side"]);
/// assert_eq!(grouped.get("item_side").unwrap()[0].shape(), &[2, 4]);
/// ```
pub fn embedding_lookup(
    x: &Tensor,
    dict: &EmbeddingDict,
    index: &FeatureIndex,
    sparse_columns: &[&SparseFeat],
    return_feat_list: &[&str],
) -> Result<GroupedEmbeddings> {
    let mut grouped = GroupedEmbeddings::new();
    for feat in sparse_columns {
        if !return_feat_list.is_empty() && !return_feat_list.iter().any(|n| *n == feat.name()) {
            continue;
        }
        let emb = lookup_sparse(x, dict, index, feat)?;
        grouped.push(feat.group_name(), emb);
    }
    Ok(grouped)
}

/// Looks up every position of each variable-length feature without pooling.
///
/// Returns `(name, [batch, maxlen, dim])` pairs in descriptor order.
pub fn varlen_embedding_lookup(
    x: &Tensor,
    dict: &EmbeddingDict,
    index: &FeatureIndex,
    varlen_columns: &[&VarLenSparseFeat],
) -> Result<Vec<(String, Tensor)>> {
    varlen_columns
        .iter()
        .map(|feat| {
            reject_hashing(feat.name(), feat.use_hash())?;
            let ids = slice_feature(x, index, feat.name())?;
            let seq = dict.table(feat.embedding_name())?.forward(&ids)?;
            Ok((feat.name().to_string(), seq))
        })
        .collect()
}

/// Pools each variable-length feature to a `[batch, dim]` tensor.
///
/// Positions past the feature's length field are ignored; without a length
/// field, positions holding id 0 are treated as padding.
pub fn get_varlen_pooling_list(
    dict: &EmbeddingDict,
    x: &Tensor,
    index: &FeatureIndex,
    varlen_columns: &[&VarLenSparseFeat],
) -> Result<Vec<Tensor>> {
    let mut pooled = Vec::with_capacity(varlen_columns.len());
    for feat in varlen_columns {
        reject_hashing(feat.name(), feat.use_hash())?;
        let ids = slice_feature(x, index, feat.name())?;
        let seq = dict.table(feat.embedding_name())?.forward(&ids)?;
        let layer = SequencePoolingLayer::new(feat.combiner());

        let out = match feat.length_name() {
            Some(length_name) => {
                let lengths = slice_feature(x, index, length_name)?;
                layer.forward_with_length(&seq, &lengths)?
            }
            None => layer.forward_with_mask(&seq, &padding_mask(&ids)?)?,
        };
        pooled.push(out);
    }
    Ok(pooled)
}

/// Slices each dense feature to a `[batch, dimension]` tensor.
pub fn get_dense_input(
    x: &Tensor,
    index: &FeatureIndex,
    dense_columns: &[&DenseFeat],
) -> Result<Vec<Tensor>> {
    dense_columns
        .iter()
        .map(|feat| slice_feature(x, index, feat.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepctr_core::{build_input_features, Combiner, FeatureColumn};
    use deepctr_layers::{Embedding, LayerError};

    fn identity_dict(name: &str, vocabulary_size: usize) -> EmbeddingDict {
        // row i = [i, -i]
        let mut table = Embedding::new(vocabulary_size, 2);
        for i in 0..vocabulary_size {
            table.set_row(i, &[i as f32, -(i as f32)]).unwrap();
        }
        let mut dict = EmbeddingDict::new();
        dict.insert(name, table);
        dict
    }

    #[test]
    fn test_grouped_embeddings_order() {
        let mut grouped = GroupedEmbeddings::new();
        grouped.push("b", Tensor::zeros(&[1, 1]));
        grouped.push("a", Tensor::zeros(&[1, 2]));
        grouped.push("b", Tensor::zeros(&[1, 3]));

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.group_names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(grouped.get("b").unwrap().len(), 2);
        assert!(grouped.get("c").is_none());

        let widths: Vec<usize> = grouped.into_list().iter().map(|t| t.shape()[1]).collect();
        assert_eq!(widths, vec![1, 3, 2]);
    }

    #[test]
    fn test_embedding_lookup_filters_and_groups() {
        let a = SparseFeat::builder("a", 10).embedding_name("ids").build().unwrap();
        let b = SparseFeat::builder("b", 10)
            .embedding_name("ids")
            .group_name("other")
            .build()
            .unwrap();
        let columns: Vec<FeatureColumn> = vec![a.clone().into(), b.clone().into()];
        let index = build_input_features(&columns);
        let dict = identity_dict("ids", 10);
        let x = Tensor::from_data(&[2, 2], vec![1.0, 2.0, 3.9, 4.0]);

        let grouped = embedding_lookup(&x, &dict, &index, &[&a, &b], &[]).unwrap();
        let a_emb = &grouped.get("default_group").unwrap()[0];
        assert_eq!(a_emb.shape(), &[2, 2]);
        // 3.9 truncates to 3
        assert_eq!(a_emb.data(), &[1.0, -1.0, 3.0, -3.0]);

        let only_b = embedding_lookup(&x, &dict, &index, &[&a, &b], &["b"]).unwrap();
        assert_eq!(only_b.group_names().collect::<Vec<_>>(), vec!["other"]);
        assert_eq!(only_b.get("other").unwrap()[0].data(), &[2.0, -2.0, 4.0, -4.0]);
    }

    #[test]
    fn test_embedding_lookup_errors() {
        let feat = SparseFeat::new("a", 4, 2).unwrap();
        let columns: Vec<FeatureColumn> = vec![feat.clone().into()];
        let index = build_input_features(&columns);

        let x = Tensor::from_data(&[1, 1], vec![4.0]);
        let err = embedding_lookup(&x, &identity_dict("a", 4), &index, &[&feat], &[]).unwrap_err();
        assert!(matches!(
            err,
            InputError::Layer(LayerError::IndexOutOfRange { index: 4, .. })
        ));

        let x = Tensor::from_data(&[1, 1], vec![1.0]);
        let err = embedding_lookup(&x, &EmbeddingDict::new(), &index, &[&feat], &[]).unwrap_err();
        assert!(matches!(err, InputError::MissingEmbedding { .. }));

        let err =
            embedding_lookup(&x, &identity_dict("a", 4), &FeatureIndex::new(), &[&feat], &[])
                .unwrap_err();
        assert!(matches!(err, InputError::MissingFeature { .. }));

        let hashed = SparseFeat::builder("a", 4).use_hash(true).build().unwrap();
        let err =
            embedding_lookup(&x, &identity_dict("a", 4), &index, &[&hashed], &[]).unwrap_err();
        assert!(matches!(err, InputError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_varlen_lookup_and_pooling() {
        let with_len = VarLenSparseFeat::new(
            SparseFeat::builder("seq", 10).embedding_dim(2).build().unwrap(),
            3,
            Combiner::Sum,
            Some("seq_len".to_string()),
        )
        .unwrap();
        let padded = VarLenSparseFeat::new(
            SparseFeat::builder("tags", 10)
                .embedding_dim(2)
                .embedding_name("seq")
                .build()
                .unwrap(),
            2,
            Combiner::Max,
            None,
        )
        .unwrap();
        let columns: Vec<FeatureColumn> = vec![with_len.clone().into(), padded.clone().into()];
        let index = build_input_features(&columns);
        assert_eq!(index.total_width(), 6);
        let dict = identity_dict("seq", 10);

        // seq = [1, 2, 5] with length 2, tags = [4, 0]
        let x = Tensor::from_data(&[1, 6], vec![1.0, 2.0, 5.0, 2.0, 4.0, 0.0]);

        let seqs = varlen_embedding_lookup(&x, &dict, &index, &[&with_len, &padded]).unwrap();
        assert_eq!(seqs[0].0, "seq");
        assert_eq!(seqs[0].1.shape(), &[1, 3, 2]);
        assert_eq!(seqs[1].1.shape(), &[1, 2, 2]);

        let pooled = get_varlen_pooling_list(&dict, &x, &index, &[&with_len, &padded]).unwrap();
        assert_eq!(pooled[0].data(), &[3.0, -3.0]);
        // padding id 0 would contribute 0.0 to the max of the second column
        assert_eq!(pooled[1].data(), &[4.0, -4.0]);
    }

    #[test]
    fn test_get_dense_input() {
        let price = DenseFeat::new("price", 1).unwrap();
        let vec2 = DenseFeat::new("vec", 2).unwrap();
        let columns: Vec<FeatureColumn> = vec![price.clone().into(), vec2.clone().into()];
        let index = build_input_features(&columns);
        let x = Tensor::from_data(&[2, 3], vec![0.5, 1.0, 2.0, 0.25, 3.0, 4.0]);

        let dense = get_dense_input(&x, &index, &[&price, &vec2]).unwrap();
        assert_eq!(dense[0].data(), &[0.5, 0.25]);
        assert_eq!(dense[1].shape(), &[2, 2]);
        assert_eq!(dense[1].data(), &[1.0, 2.0, 3.0, 4.0]);
    }
}
