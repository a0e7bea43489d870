//! Concatenation helpers for lists of tensors.

use crate::error::{LayerError, LayerResult};
use crate::tensor::Tensor;

/// Concatenates tensors along their last axis.
///
/// All tensors must have the same rank and agree on every dimension but the
/// last one.
///
/// # Example
///
/// ```
/// use deepctr_layers::merge::concat_last;
/// use deepctr_layers::tensor::Tensor;
///
/// let a = Tensor::from_data(&[2, 1], vec![1.0, 2.0]);
/// let b = Tensor::from_data(&[2, 2], vec![3.0, 4.0, 5.0, 6.0]);
/// let c = concat_last(&[a, b]).unwrap();
/// assert_eq!(c.shape(), &[2, 3]);
/// assert_eq!(c.data(), &[1.0, 3.0, 4.0, 2.0, 5.0, 6.0]);
/// ```
pub fn concat_last(tensors: &[Tensor]) -> LayerResult<Tensor> {
    let first = tensors.first().ok_or_else(|| LayerError::ForwardError {
        message: "concat expects a non-empty tensor list".to_string(),
    })?;
    if first.ndim() == 0 {
        return Err(LayerError::InvalidRank {
            expected: 1,
            actual: 0,
        });
    }

    let lead = &first.shape()[..first.ndim() - 1];
    for t in tensors {
        if t.ndim() != first.ndim() || &t.shape()[..t.ndim() - 1] != lead {
            let mut expected = lead.to_vec();
            expected.push(t.shape().last().copied().unwrap_or(0));
            return Err(LayerError::ShapeMismatch {
                expected,
                actual: t.shape().to_vec(),
            });
        }
    }

    let outer: usize = lead.iter().product();
    let widths: Vec<usize> = tensors.iter().map(|t| t.shape()[t.ndim() - 1]).collect();
    let total: usize = widths.iter().sum();

    let mut data = Vec::with_capacity(outer * total);
    for row in 0..outer {
        for (t, &w) in tensors.iter().zip(&widths) {
            data.extend_from_slice(&t.data()[row * w..(row + 1) * w]);
        }
    }

    let mut shape = lead.to_vec();
    shape.push(total);
    Ok(Tensor::from_data(&shape, data))
}

/// Concatenates along the last axis, returning a single input unchanged.
pub fn concat_fun(tensors: &[Tensor]) -> LayerResult<Tensor> {
    match tensors {
        [single] => Ok(single.clone()),
        _ => concat_last(tensors),
    }
}
