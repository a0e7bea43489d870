//! Embedding table parameters.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default standard deviation of the normal initializer for embedding tables.
pub const DEFAULT_INIT_STD: f32 = 1e-4;

fn default_init_std() -> f32 {
    DEFAULT_INIT_STD
}

/// Settings used when building the embedding table set.
///
/// # Examples
///
/// ```
/// use deepctr_core::params::EmbeddingMatrixConfig;
///
/// let config = EmbeddingMatrixConfig::default().with_seed(1024).with_linear(true);
/// assert!(config.linear);
/// assert_eq!(config.seed, Some(1024));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrixConfig {
    /// Standard deviation of the zero-mean normal initializer.
    #[serde(default = "default_init_std")]
    pub init_std: f32,

    /// Forces every table to width 1 (linear/logit tables).
    #[serde(default)]
    pub linear: bool,

    /// Marks tables as producing sparse gradients.
    #[serde(default)]
    pub sparse: bool,

    /// Seed for deterministic initialization. Entropy-seeded when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EmbeddingMatrixConfig {
    fn default() -> Self {
        Self {
            init_std: DEFAULT_INIT_STD,
            linear: false,
            sparse: false,
            seed: None,
        }
    }
}

impl EmbeddingMatrixConfig {
    /// Sets the initializer standard deviation.
    pub fn with_init_std(mut self, init_std: f32) -> Self {
        self.init_std = init_std;
        self
    }

    /// Enables or disables linear mode.
    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    /// Enables or disables sparse gradient mode.
    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Sets the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that the initializer settings are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.init_std.is_finite() || self.init_std < 0.0 {
            return Err(CoreError::config(format!(
                "init_std must be a finite non-negative number, got {}",
                self.init_std
            )));
        }
        Ok(())
    }
}
