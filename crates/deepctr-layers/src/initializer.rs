//! Weight initialization for embedding tables.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::tensor::Tensor;

/// How the values of a new weight tensor are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// All zeros.
    Zeros,
    /// Constant value.
    Constant(f32),
    /// Independent draws from `Normal(mean, stddev)`.
    RandomNormal {
        /// Mean of the distribution.
        mean: f32,
        /// Standard deviation of the distribution.
        stddev: f32,
    },
}

impl Initializer {
    /// Zero-mean normal initializer, the default for embedding tables.
    pub fn normal(stddev: f32) -> Self {
        Initializer::RandomNormal { mean: 0.0, stddev }
    }

    /// Builds a tensor of the given shape.
    ///
    /// # Example
    ///
    /// ```
    /// use deepctr_layers::initializer::{seeded_rng, Initializer};
    ///
    /// let mut rng = seeded_rng(Some(42));
    /// let w = Initializer::normal(0.01).initialize(&[10, 4], &mut rng).unwrap();
    /// assert_eq!(w.shape(), &[10, 4]);
    /// ```
    pub fn initialize<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> LayerResult<Tensor> {
        let numel: usize = shape.iter().product();
        let data = match *self {
            Initializer::Zeros => vec![0.0; numel],
            Initializer::Constant(value) => vec![value; numel],
            Initializer::RandomNormal { mean, stddev } => {
                let normal =
                    Normal::new(mean, stddev).map_err(|e| LayerError::InitializationError {
                        message: format!("invalid normal(mean={mean}, stddev={stddev}): {e}"),
                    })?;
                (0..numel).map(|_| normal.sample(rng)).collect()
            }
        };
        Ok(Tensor::from_data(shape, data))
    }
}

/// Returns a seeded RNG, or one seeded from OS entropy when `seed` is `None`.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
