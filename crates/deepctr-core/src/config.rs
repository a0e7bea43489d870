//! Loading feature configurations from JSON.
//!
//! A configuration file looks like:
//!
//! ```json
//! {
//!   "features": [
//!     {"type": "sparse", "name": "gender", "vocabulary_size": 2, "embedding_dim": 4},
//!     {"type": "dense", "name": "age"},
//!     {"type": "varlen_sparse", "maxlen": 5, "combiner": "sum",
//!      "sparsefeat": {"name": "hist", "vocabulary_size": 100, "embedding_dim": 8}}
//!   ],
//!   "embedding": {"init_std": 0.0001, "seed": 1024}
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::feature::FeatureColumn;
use crate::params::EmbeddingMatrixConfig;

/// A complete feature configuration: descriptors plus table settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Feature descriptors in layout order.
    pub features: Vec<FeatureColumn>,

    /// Embedding table settings.
    #[serde(default)]
    pub embedding: EmbeddingMatrixConfig,
}

impl FeatureConfig {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        let features = match value.get_mut("features") {
            Some(features) => parse_feature_values(features.take())?,
            None => return Err(CoreError::config("missing `features` section")),
        };
        let embedding = match value.get_mut("embedding") {
            Some(embedding) => serde_json::from_value(embedding.take())?,
            None => EmbeddingMatrixConfig::default(),
        };
        embedding.validate()?;

        Ok(Self {
            features,
            embedding,
        })
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "Loading feature config");
        Self::from_json_str(&json)
    }
}

/// Parses a JSON array of feature descriptors.
///
/// Fails with [`CoreError::InvalidFeatureKind`] when an entry's `type` tag is
/// not one of [`FeatureColumn::KINDS`].
pub fn parse_feature_columns(json: &str) -> Result<Vec<FeatureColumn>> {
    parse_feature_values(serde_json::from_str(json)?)
}

fn parse_feature_values(value: Value) -> Result<Vec<FeatureColumn>> {
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(CoreError::config(format!(
                "feature columns must be a JSON array, got {other}"
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| -> Result<FeatureColumn> {
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| "<missing>".to_string());
            if !FeatureColumn::KINDS.contains(&kind.as_str()) {
                return Err(CoreError::InvalidFeatureKind { kind });
            }
            Ok(serde_json::from_value(entry)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"{
        "features": [
            {"type": "sparse", "name": "gender", "vocabulary_size": 2, "embedding_dim": 4},
            {"type": "dense", "name": "age"},
            {"type": "varlen_sparse", "maxlen": 5, "combiner": "sum", "length_name": "hist_len",
             "sparsefeat": {"name": "hist", "vocabulary_size": 100, "embedding_dim": 8}}
        ],
        "embedding": {"init_std": 0.01, "seed": 7}
    }"#;

    #[test]
    fn test_parse_config() {
        let config = FeatureConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.features.len(), 3);
        assert_eq!(config.features[1].name(), "age");
        assert_eq!(config.embedding.seed, Some(7));
        assert_eq!(config.embedding.init_std, 0.01);
    }

    #[test]
    fn test_embedding_section_is_optional() {
        let config = FeatureConfig::from_json_str(
            r#"{"features": [{"type": "dense", "name": "x", "dimension": 2}]}"#,
        )
        .unwrap();
        assert_eq!(config.embedding, EmbeddingMatrixConfig::default());
    }

    #[test]
    fn test_invalid_feature_kind() {
        let err = parse_feature_columns(r#"[{"type": "sequence", "name": "x"}]"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFeatureKind { kind } if kind == "sequence"));

        let err = parse_feature_columns(r#"[{"name": "x"}]"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFeatureKind { .. }));
    }

    #[test]
    fn test_invalid_embedding_section() {
        let err = FeatureConfig::from_json_str(
            r#"{"features": [], "embedding": {"init_std": -1.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigError { .. }));

        let err = FeatureConfig::from_json_str(r#"{"embedding": {}}"#).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError { .. }));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = FeatureConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.features[2].kind(), "varlen_sparse");

        assert!(FeatureConfig::from_json_file("/nonexistent/features.json").is_err());
    }
}
