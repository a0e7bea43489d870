//! Embedding tables for sparse categorical features.
//!
//! An [`Embedding`] is a dense `[vocabulary_size, dim]` weight matrix indexed by
//! integer category ids. Ids arrive as `f32` columns of an input batch and are
//! truncated toward zero before lookup.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::initializer::Initializer;
use crate::tensor::Tensor;

/// Converts a raw input value into a table index.
///
/// The value is truncated toward zero. Negative and non-finite values are
/// rejected.
pub fn to_index(value: f32) -> LayerResult<usize> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < 0.0 {
        return Err(LayerError::InvalidIndex { value });
    }
    Ok(truncated as usize)
}

/// A dense embedding table.
///
/// # Example
///
/// ```
/// use deepctr_layers::embedding::Embedding;
/// use deepctr_layers::tensor::Tensor;
///
/// let mut table = Embedding::new(3, 2);
/// table.set_row(1, &[0.5, -0.5]).unwrap();
///
/// let ids = Tensor::from_data(&[2, 1], vec![1.0, 0.0]);
/// let out = table.forward(&ids).unwrap();
/// assert_eq!(out.shape(), &[2, 1, 2]);
/// assert_eq!(out.data(), &[0.5, -0.5, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Weight matrix of shape [vocabulary_size, dim]
    weight: Tensor,
    /// Whether the table produces sparse gradients
    sparse: bool,
}

impl Embedding {
    /// Creates a zero-initialized table.
    pub fn new(vocabulary_size: usize, dim: usize) -> Self {
        Self {
            weight: Tensor::zeros(&[vocabulary_size, dim]),
            sparse: false,
        }
    }

    /// Creates a table with values drawn from `initializer`.
    pub fn with_initializer<R: Rng + ?Sized>(
        vocabulary_size: usize,
        dim: usize,
        initializer: &Initializer,
        rng: &mut R,
    ) -> LayerResult<Self> {
        Ok(Self {
            weight: initializer.initialize(&[vocabulary_size, dim], rng)?,
            sparse: false,
        })
    }

    /// Wraps an existing `[vocabulary_size, dim]` weight matrix.
    pub fn from_weight(weight: Tensor) -> LayerResult<Self> {
        weight.expect_rank(2)?;
        Ok(Self {
            weight,
            sparse: false,
        })
    }

    /// Marks the table as producing sparse gradients.
    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Returns the number of rows.
    pub fn vocabulary_size(&self) -> usize {
        self.weight.shape()[0]
    }

    /// Returns the embedding dimension.
    pub fn dim(&self) -> usize {
        self.weight.shape()[1]
    }

    /// Returns whether the table produces sparse gradients.
    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    /// Returns the weight matrix.
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Returns the weight matrix for in-place updates.
    pub fn weight_mut(&mut self) -> &mut Tensor {
        &mut self.weight
    }

    fn check_index(&self, index: usize) -> LayerResult<()> {
        if index >= self.vocabulary_size() {
            return Err(LayerError::IndexOutOfRange {
                index,
                vocabulary_size: self.vocabulary_size(),
            });
        }
        Ok(())
    }

    /// Returns the embedding row for `index`.
    pub fn row(&self, index: usize) -> LayerResult<&[f32]> {
        self.check_index(index)?;
        let dim = self.dim();
        Ok(&self.weight.data()[index * dim..(index + 1) * dim])
    }

    /// Overwrites the embedding row for `index`.
    pub fn set_row(&mut self, index: usize, values: &[f32]) -> LayerResult<()> {
        self.check_index(index)?;
        let dim = self.dim();
        if values.len() != dim {
            return Err(LayerError::ShapeMismatch {
                expected: vec![dim],
                actual: vec![values.len()],
            });
        }
        self.weight.data_mut()[index * dim..(index + 1) * dim].copy_from_slice(values);
        Ok(())
    }

    /// Looks up a list of indices.
    ///
    /// Returns a tensor of shape `[ids.len(), dim]`.
    pub fn lookup(&self, ids: &[usize]) -> LayerResult<Tensor> {
        let dim = self.dim();
        let mut data = Vec::with_capacity(ids.len() * dim);
        for &id in ids {
            data.extend_from_slice(self.row(id)?);
        }
        Ok(Tensor::from_data(&[ids.len(), dim], data))
    }

    /// Looks up every element of `indices`.
    ///
    /// The output has shape `indices.shape() + [dim]`.
    pub fn forward(&self, indices: &Tensor) -> LayerResult<Tensor> {
        let ids = indices
            .data()
            .iter()
            .map(|&v| to_index(v))
            .collect::<LayerResult<Vec<_>>>()?;
        let looked_up = self.lookup(&ids)?;

        let mut shape = indices.shape().to_vec();
        shape.push(self.dim());
        looked_up.reshape(&shape)
    }
}
