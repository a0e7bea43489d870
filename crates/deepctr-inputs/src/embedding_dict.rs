//! The embedding table set and its factory.
//!
//! One [`Embedding`] is created per distinct `embedding_name` among the sparse
//! and variable-length descriptors. Descriptors that share a name read from
//! the same table, so updating it affects all of them.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;

use deepctr_core::{
    sparse_feature_columns, varlen_sparse_feature_columns, EmbeddingMatrixConfig, FeatureColumn,
};
use deepctr_layers::{seeded_rng, Embedding, Initializer};

use crate::error::{InputError, Result};

/// Embedding tables keyed by embedding name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingDict {
    tables: BTreeMap<String, Embedding>,
}

impl EmbeddingDict {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a table, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, table: Embedding) -> Option<Embedding> {
        self.tables.insert(name.into(), table)
    }

    /// Returns the table named `name`.
    pub fn get(&self, name: &str) -> Option<&Embedding> {
        self.tables.get(name)
    }

    /// Returns the table named `name` for in-place updates.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Embedding> {
        self.tables.get_mut(name)
    }

    /// Returns the table named `name`, or [`InputError::MissingEmbedding`].
    pub fn table(&self, name: &str) -> Result<&Embedding> {
        self.get(name).ok_or_else(|| InputError::MissingEmbedding {
            name: name.to_string(),
        })
    }

    /// Returns whether a table named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if there are no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the table names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Iterates `(name, table)` pairs in sorted order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Embedding> {
        self.tables.iter()
    }

    /// Returns the total number of trainable values across all tables.
    pub fn num_parameters(&self) -> usize {
        self.tables.values().map(|t| t.weight().numel()).sum()
    }
}

/// Builds one embedding table per distinct embedding name.
///
/// Only sparse and variable-length descriptors get tables. Each table has
/// shape `[vocabulary_size, embedding_dim]`, or `[vocabulary_size, 1]` in
/// linear mode, and is filled from `Normal(0, init_std)`. Descriptors that
/// share an embedding name must agree on both dimensions.
///
/// # Example
///
/// ```
/// use deepctr_core::{EmbeddingMatrixConfig, FeatureColumn, SparseFeat};
/// use deepctr_inputs::create_embedding_matrix;
///
/// let columns: Vec<FeatureColumn> = vec![SparseFeat::new("gender", 2, 4).unwrap().into()];
/// let dict = create_embedding_matrix(&columns, &EmbeddingMatrixConfig::default()).unwrap();
/// assert_eq!(dict.get("gender").unwrap().weight().shape(), &[2, 4]);
/// ```
pub fn create_embedding_matrix(
    columns: &[FeatureColumn],
    config: &EmbeddingMatrixConfig,
) -> Result<EmbeddingDict> {
    config.validate()?;

    let sparse = sparse_feature_columns(columns).into_iter().map(|f| {
        (
            f.name(),
            f.embedding_name(),
            f.vocabulary_size(),
            f.embedding_dim(),
        )
    });
    let varlen = varlen_sparse_feature_columns(columns)
        .into_iter()
        .map(|f| {
            (
                f.name(),
                f.embedding_name(),
                f.vocabulary_size(),
                f.embedding_dim(),
            )
        });

    let mut rng = seeded_rng(config.seed);
    let initializer = Initializer::normal(config.init_std);
    let mut dict = EmbeddingDict::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for (feature, embedding_name, vocabulary_size, embedding_dim) in sparse.chain(varlen) {
        let dim = if config.linear { 1 } else { embedding_dim };

        if let Some(existing) = dict.get(embedding_name) {
            if existing.vocabulary_size() != vocabulary_size || existing.dim() != dim {
                let owner = owners.get(embedding_name).copied().unwrap_or_default();
                return Err(InputError::ConfigError {
                    message: format!(
                        "embedding `{embedding_name}` is [{}, {}] for feature `{owner}` but \
                         [{vocabulary_size}, {dim}] for feature `{feature}`",
                        existing.vocabulary_size(),
                        existing.dim(),
                    ),
                });
            }
            continue;
        }

        let table = Embedding::with_initializer(vocabulary_size, dim, &initializer, &mut rng)?
            .with_sparse(config.sparse);
        tracing::debug!(
            embedding_name,
            vocabulary_size,
            dim,
            sparse = config.sparse,
            "Created embedding table"
        );
        dict.insert(embedding_name, table);
        owners.insert(embedding_name, feature);
    }

    Ok(dict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepctr_core::{Combiner, DenseFeat, SparseFeat, VarLenSparseFeat};

    fn columns() -> Vec<FeatureColumn> {
        vec![
            SparseFeat::new("user", 10, 4).unwrap().into(),
            SparseFeat::builder("item", 20)
                .embedding_dim(8)
                .build()
                .unwrap()
                .into(),
            DenseFeat::new("price", 1).unwrap().into(),
            VarLenSparseFeat::new(
                SparseFeat::builder("hist_item", 20)
                    .embedding_dim(8)
                    .embedding_name("item")
                    .build()
                    .unwrap(),
                5,
                Combiner::Mean,
                None,
            )
            .unwrap()
            .into(),
        ]
    }

    #[test]
    fn test_one_table_per_embedding_name() {
        let dict = create_embedding_matrix(&columns(), &EmbeddingMatrixConfig::default()).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.names().collect::<Vec<_>>(), vec!["item", "user"]);
        assert_eq!(dict.get("user").unwrap().weight().shape(), &[10, 4]);
        assert_eq!(dict.get("item").unwrap().weight().shape(), &[20, 8]);
        assert!(!dict.contains("price"));
        assert_eq!(dict.num_parameters(), 10 * 4 + 20 * 8);
    }

    #[test]
    fn test_linear_and_sparse_modes() {
        let config = EmbeddingMatrixConfig::default()
            .with_linear(true)
            .with_sparse(true);
        let dict = create_embedding_matrix(&columns(), &config).unwrap();
        for (_, table) in dict.iter() {
            assert_eq!(table.dim(), 1);
            assert!(table.is_sparse());
        }
    }

    #[test]
    fn test_seeded_initialization() {
        let config = EmbeddingMatrixConfig::default()
            .with_init_std(0.5)
            .with_seed(1024);
        let a = create_embedding_matrix(&columns(), &config).unwrap();
        let b = create_embedding_matrix(&columns(), &config).unwrap();
        assert_eq!(a, b);

        let zero = create_embedding_matrix(&columns(), &config.clone().with_init_std(0.0)).unwrap();
        assert!(zero
            .iter()
            .all(|(_, t)| t.weight().data().iter().all(|&x| x == 0.0)));
    }

    #[test]
    fn test_conflicting_shared_tables() {
        let columns: Vec<FeatureColumn> = vec![
            SparseFeat::builder("a", 10)
                .embedding_name("shared")
                .build()
                .unwrap()
                .into(),
            SparseFeat::builder("b", 11)
                .embedding_name("shared")
                .build()
                .unwrap()
                .into(),
        ];
        let err = create_embedding_matrix(&columns, &EmbeddingMatrixConfig::default()).unwrap_err();
        match err {
            InputError::ConfigError { message } => {
                assert!(message.contains("shared"));
                assert!(message.contains("`a`"));
                assert!(message.contains("`b`"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_init_std() {
        let config = EmbeddingMatrixConfig::default().with_init_std(-0.1);
        assert!(matches!(
            create_embedding_matrix(&columns(), &config),
            Err(InputError::Core(_))
        ));
    }
}
