//! Assembly of the flat DNN input.

use deepctr_layers::{concat_last, Tensor};

use crate::error::{InputError, Result};

/// Concatenates sparse embeddings and dense values into one `[batch, width]`
/// tensor.
///
/// Sparse embeddings come first. Each list is concatenated along the feature
/// axis and flattened from dimension 1, so both `[batch, dim]` and
/// `[batch, 1, dim]` embeddings are accepted.
///
/// # Example
///
/// ```
/// use deepctr_inputs::combined_dnn_input;
/// use deepctr_layers::Tensor;
///
/// let emb = Tensor::from_data(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]);
/// let age = Tensor::from_data(&[2, 1], vec![0.5, 0.25]);
/// let out = combined_dnn_input(&[emb], &[age]).unwrap();
/// assert_eq!(out.data(), &[1.0, 2.0, 0.5, 3.0, 4.0, 0.25]);
/// ```
pub fn combined_dnn_input(
    sparse_embedding_list: &[Tensor],
    dense_value_list: &[Tensor],
) -> Result<Tensor> {
    match (sparse_embedding_list.is_empty(), dense_value_list.is_empty()) {
        (false, false) => {
            let sparse = concat_last(sparse_embedding_list)?.flatten_from(1);
            let dense = concat_last(dense_value_list)?.flatten_from(1);
            Ok(concat_last(&[sparse, dense])?)
        }
        (false, true) => Ok(concat_last(sparse_embedding_list)?.flatten_from(1)),
        (true, false) => Ok(concat_last(dense_value_list)?.flatten_from(1)),
        (true, true) => Err(InputError::NoInput),
    }
}
