//! Masked pooling over embedded sequences.
//!
//! [`SequencePoolingLayer`] reduces a `[batch, maxlen, dim]` tensor to
//! `[batch, dim]`, ignoring padded positions. Validity comes either from an
//! explicit per-example length ([`sequence_mask`]) or from the raw ids, where
//! `0` marks padding ([`padding_mask`]).

use deepctr_core::Combiner;

use crate::embedding::to_index;
use crate::error::{LayerError, LayerResult};
use crate::tensor::Tensor;

/// Builds a `[batch * maxlen]` validity mask from per-example lengths.
///
/// `lengths` must hold one value per example (`[batch]` or `[batch, 1]`).
/// Position `t` of example `i` is valid when `t < lengths[i]`.
pub fn sequence_mask(lengths: &Tensor, maxlen: usize) -> LayerResult<Vec<bool>> {
    let batch = lengths.batch_size();
    if lengths.numel() != batch {
        return Err(LayerError::ShapeMismatch {
            expected: vec![batch, 1],
            actual: lengths.shape().to_vec(),
        });
    }

    let mut mask = Vec::with_capacity(batch * maxlen);
    for &value in lengths.data() {
        let len = to_index(value)?;
        mask.extend((0..maxlen).map(|t| t < len));
    }
    Ok(mask)
}

/// Builds a validity mask from raw ids: a position is valid when its id is not 0.
pub fn padding_mask(ids: &Tensor) -> LayerResult<Vec<bool>> {
    ids.data()
        .iter()
        .map(|&v| to_index(v).map(|id| id != 0))
        .collect()
}

/// Pools an embedded sequence with a [`Combiner`].
///
/// Examples with no valid position pool to the zero vector for every mode.
///
/// # Example
///
/// ```
/// use deepctr_core::Combiner;
/// use deepctr_layers::sequence::SequencePoolingLayer;
/// use deepctr_layers::tensor::Tensor;
///
/// // One example, three positions, dim 2; only the first two are valid.
/// let seq = Tensor::from_data(&[1, 3, 2], vec![1.0, 2.0, 3.0, 4.0, 9.0, 9.0]);
/// let layer = SequencePoolingLayer::new(Combiner::Mean);
/// let out = layer.forward_with_mask(&seq, &[true, true, false]).unwrap();
/// assert_eq!(out.data(), &[2.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePoolingLayer {
    mode: Combiner,
}

impl SequencePoolingLayer {
    /// Creates a pooling layer.
    pub fn new(mode: Combiner) -> Self {
        Self { mode }
    }

    /// Returns the pooling mode.
    pub fn mode(&self) -> Combiner {
        self.mode
    }

    /// Pools `seq` (`[batch, maxlen, dim]`) over the positions marked valid in
    /// `mask` (`batch * maxlen` entries, row-major).
    pub fn forward_with_mask(&self, seq: &Tensor, mask: &[bool]) -> LayerResult<Tensor> {
        seq.expect_rank(3)?;
        let (batch, maxlen, dim) = (seq.shape()[0], seq.shape()[1], seq.shape()[2]);
        if mask.len() != batch * maxlen {
            return Err(LayerError::ShapeMismatch {
                expected: vec![batch, maxlen],
                actual: vec![mask.len()],
            });
        }

        let data = seq.data();
        let mut out = vec![0.0f32; batch * dim];
        for i in 0..batch {
            let pooled = &mut out[i * dim..(i + 1) * dim];
            let mut count = 0usize;

            for t in 0..maxlen {
                if !mask[i * maxlen + t] {
                    continue;
                }
                let offset = (i * maxlen + t) * dim;
                let emb = &data[offset..offset + dim];
                match self.mode {
                    Combiner::Sum | Combiner::Mean => {
                        for (p, &e) in pooled.iter_mut().zip(emb) {
                            *p += e;
                        }
                    }
                    Combiner::Max if count == 0 => pooled.copy_from_slice(emb),
                    Combiner::Max => {
                        for (p, &e) in pooled.iter_mut().zip(emb) {
                            *p = p.max(e);
                        }
                    }
                }
                count += 1;
            }

            if self.mode == Combiner::Mean {
                let denom = count.max(1) as f32;
                for p in pooled.iter_mut() {
                    *p /= denom;
                }
            }
        }

        Ok(Tensor::from_data(&[batch, dim], out))
    }

    /// Pools `seq` using explicit per-example lengths.
    pub fn forward_with_length(&self, seq: &Tensor, lengths: &Tensor) -> LayerResult<Tensor> {
        seq.expect_rank(3)?;
        if lengths.batch_size() != seq.shape()[0] {
            return Err(LayerError::ShapeMismatch {
                expected: vec![seq.shape()[0], 1],
                actual: lengths.shape().to_vec(),
            });
        }
        let mask = sequence_mask(lengths, seq.shape()[1])?;
        self.forward_with_mask(seq, &mask)
    }
}
