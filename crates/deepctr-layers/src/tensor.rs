//! Dense row-major tensor used for input batches and embeddings.
//!
//! Input batches are `[batch_size, total_width]` tensors whose columns follow a
//! feature layout; embeddings come back as `[batch_size, dim]` or
//! `[batch_size, maxlen, dim]`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};

/// A multi-dimensional `f32` array in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// The shape of the tensor (dimensions)
    shape: Vec<usize>,
    /// The underlying data in row-major order
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor with the given shape, filled with zeros.
    ///
    /// # Example
    ///
    /// ```
    /// use deepctr_layers::tensor::Tensor;
    ///
    /// let t = Tensor::zeros(&[2, 3]);
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert_eq!(t.numel(), 6);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        let numel: usize = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; numel],
        }
    }

    /// Creates a new tensor with the given shape and data.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the shape
    pub fn from_data(shape: &[usize], data: Vec<f32>) -> Self {
        let numel: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            numel,
            "Data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            numel
        );
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Creates a tensor, returning an error if the data length doesn't match the shape.
    pub fn try_from_data(shape: &[usize], data: Vec<f32>) -> LayerResult<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(LayerError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: vec![data.len()],
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Builds a `[rows.len(), width]` tensor from equally sized rows.
    ///
    /// ```
    /// use deepctr_layers::tensor::Tensor;
    ///
    /// let t = Tensor::from_rows(&[vec![1.0, 0.5], vec![0.0, 2.0]]).unwrap();
    /// assert_eq!(t.shape(), &[2, 2]);
    /// ```
    pub fn from_rows(rows: &[Vec<f32>]) -> LayerResult<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(LayerError::ShapeMismatch {
                    expected: vec![width],
                    actual: vec![row.len()],
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            shape: vec![rows.len(), width],
            data,
        })
    }

    /// Returns the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the total number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the size of the leading (batch) dimension, 0 for scalars.
    pub fn batch_size(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Returns a reference to the underlying data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns a mutable reference to the underlying data.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor and returns its data.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Returns row `i` of a 2D tensor.
    pub fn row(&self, i: usize) -> LayerResult<&[f32]> {
        self.expect_rank(2)?;
        if i >= self.shape[0] {
            return Err(LayerError::ForwardError {
                message: format!("row {i} out of bounds for {} rows", self.shape[0]),
            });
        }
        let width = self.shape[1];
        Ok(&self.data[i * width..(i + 1) * width])
    }

    /// Copies columns `cols` of a 2D tensor into a new `[rows, cols.len()]` tensor.
    ///
    /// ```
    /// use deepctr_layers::tensor::Tensor;
    ///
    /// let t = Tensor::from_data(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let s = t.narrow_columns(1..3).unwrap();
    /// assert_eq!(s.data(), &[2.0, 3.0, 5.0, 6.0]);
    /// ```
    pub fn narrow_columns(&self, cols: Range<usize>) -> LayerResult<Tensor> {
        self.expect_rank(2)?;
        let (rows, width) = (self.shape[0], self.shape[1]);
        if cols.start > cols.end || cols.end > width {
            return Err(LayerError::ForwardError {
                message: format!(
                    "column range {}..{} out of bounds for width {width}",
                    cols.start, cols.end
                ),
            });
        }

        let out_width = cols.end - cols.start;
        let mut data = Vec::with_capacity(rows * out_width);
        for chunk in self.data.chunks_exact(width.max(1)).take(rows) {
            data.extend_from_slice(&chunk[cols.clone()]);
        }
        Ok(Tensor::from_data(&[rows, out_width], data))
    }

    /// Reshapes the tensor, keeping the element order.
    pub fn reshape(&self, new_shape: &[usize]) -> LayerResult<Tensor> {
        let new_numel: usize = new_shape.iter().product();
        if new_numel != self.numel() {
            return Err(LayerError::ShapeMismatch {
                expected: new_shape.to_vec(),
                actual: self.shape.clone(),
            });
        }
        Ok(Tensor::from_data(new_shape, self.data.clone()))
    }

    /// Collapses every dimension from `start_dim` onwards into one.
    ///
    /// ```
    /// use deepctr_layers::tensor::Tensor;
    ///
    /// let t = Tensor::zeros(&[4, 1, 8]);
    /// assert_eq!(t.flatten_from(1).shape(), &[4, 8]);
    /// ```
    pub fn flatten_from(&self, start_dim: usize) -> Tensor {
        if start_dim >= self.ndim() {
            return self.clone();
        }
        let mut shape = self.shape[..start_dim].to_vec();
        shape.push(self.shape[start_dim..].iter().product());
        Tensor::from_data(&shape, self.data.clone())
    }

    pub(crate) fn expect_rank(&self, rank: usize) -> LayerResult<()> {
        if self.ndim() != rank {
            return Err(LayerError::InvalidRank {
                expected: rank,
                actual: self.ndim(),
            });
        }
        Ok(())
    }
}
