//! Feature descriptors for DeepCTR.
//!
//! A model configuration is an ordered list of [`FeatureColumn`]s. Each column
//! names one feature and says how its raw input columns are turned into
//! tensors:
//!
//! - [`SparseFeat`]: a single categorical index embedded through a table.
//! - [`DenseFeat`]: a pre-computed numeric vector of fixed width.
//! - [`VarLenSparseFeat`]: a padded sequence of categorical indices that is
//!   embedded and pooled into one vector.
//!
//! Descriptors are immutable once built. Equality and hashing are keyed on the
//! feature name only.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Group name used by sparse features that do not declare one.
pub const DEFAULT_GROUP_NAME: &str = "default_group";

/// Embedding dimension used by sparse features that do not declare one.
pub const DEFAULT_EMBEDDING_DIM: usize = 4;

/// Declared input dtype of a feature.
///
/// Batches are always carried as `f32`; the dtype records how the caller
/// encoded the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
}

impl DType {
    fn sparse_default() -> Self {
        DType::Int32
    }

    fn dense_default() -> Self {
        DType::Float32
    }
}

/// Pooling strategy for variable-length sparse features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Combiner {
    /// Sum over valid positions.
    Sum,
    /// Mean over valid positions.
    #[default]
    Mean,
    /// Element-wise maximum over valid positions.
    Max,
}

impl Combiner {
    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Combiner::Sum => "sum",
            Combiner::Mean => "mean",
            Combiner::Max => "max",
        }
    }
}

impl fmt::Display for Combiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Combiner {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(Combiner::Sum),
            "mean" => Ok(Combiner::Mean),
            "max" => Ok(Combiner::Max),
            other => Err(CoreError::InvalidCombiner {
                combiner: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Combiner {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Combiner> for String {
    fn from(value: Combiner) -> Self {
        value.as_str().to_string()
    }
}

/// Embedding dimension of a sparse feature, either explicit or derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingDim {
    /// An explicit dimension.
    Fixed(usize),
    /// Derived from the vocabulary size as `floor(6 * vocabulary_size^0.25)`.
    Auto,
}

impl EmbeddingDim {
    /// Resolves the dimension for a vocabulary of the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepctr_core::feature::EmbeddingDim;
    ///
    /// assert_eq!(EmbeddingDim::Auto.resolve(1000), 33);
    /// assert_eq!(EmbeddingDim::Fixed(8).resolve(1000), 8);
    /// ```
    pub fn resolve(self, vocabulary_size: usize) -> usize {
        match self {
            EmbeddingDim::Fixed(dim) => dim,
            // sqrt(sqrt(x)) keeps perfect fourth powers exact.
            EmbeddingDim::Auto => (6.0 * (vocabulary_size as f64).sqrt().sqrt()).floor() as usize,
        }
    }
}

impl Default for EmbeddingDim {
    fn default() -> Self {
        EmbeddingDim::Fixed(DEFAULT_EMBEDDING_DIM)
    }
}

impl From<usize> for EmbeddingDim {
    fn from(dim: usize) -> Self {
        EmbeddingDim::Fixed(dim)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingDimRepr {
    Fixed(usize),
    Keyword(String),
}

impl<'de> Deserialize<'de> for EmbeddingDim {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match EmbeddingDimRepr::deserialize(deserializer)? {
            EmbeddingDimRepr::Fixed(dim) => Ok(EmbeddingDim::Fixed(dim)),
            EmbeddingDimRepr::Keyword(word) if word == "auto" => Ok(EmbeddingDim::Auto),
            EmbeddingDimRepr::Keyword(word) => Err(de::Error::custom(format!(
                "invalid embedding_dim `{word}`, expected an integer or \"auto\""
            ))),
        }
    }
}

impl Serialize for EmbeddingDim {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            EmbeddingDim::Fixed(dim) => serializer.serialize_u64(*dim as u64),
            EmbeddingDim::Auto => serializer.serialize_str("auto"),
        }
    }
}

fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::config(format!("{kind} name must not be empty")));
    }
    Ok(())
}

/// A sparse categorical feature embedded through a lookup table.
///
/// # Examples
///
/// ```
/// use deepctr_core::feature::{SparseFeat, DEFAULT_GROUP_NAME};
///
/// let feat = SparseFeat::new("gender", 2, 4).unwrap();
/// assert_eq!(feat.embedding_name(), "gender");
/// assert_eq!(feat.group_name(), DEFAULT_GROUP_NAME);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SparseFeatBuilder")]
pub struct SparseFeat {
    name: String,
    vocabulary_size: usize,
    embedding_dim: usize,
    use_hash: bool,
    dtype: DType,
    embedding_name: String,
    group_name: String,
}

impl SparseFeat {
    /// Creates a sparse feature with default dtype, embedding name and group.
    pub fn new(
        name: impl Into<String>,
        vocabulary_size: usize,
        embedding_dim: impl Into<EmbeddingDim>,
    ) -> Result<Self> {
        Self::builder(name, vocabulary_size)
            .embedding_dim(embedding_dim)
            .build()
    }

    /// Creates a builder for a sparse feature.
    pub fn builder(name: impl Into<String>, vocabulary_size: usize) -> SparseFeatBuilder {
        SparseFeatBuilder::new(name, vocabulary_size)
    }

    /// Returns the feature name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of distinct indices the feature can take.
    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// Returns the resolved embedding dimension.
    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Returns whether on-the-fly hashing was requested.
    #[inline]
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Returns the declared input dtype.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the name of the embedding table this feature reads from.
    #[inline]
    pub fn embedding_name(&self) -> &str {
        &self.embedding_name
    }

    /// Returns the logical group this feature's embedding is collected under.
    #[inline]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }
}

impl PartialEq for SparseFeat {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SparseFeat {}

impl Hash for SparseFeat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Builder for [`SparseFeat`], also its deserialized form.
#[derive(Debug, Clone, Deserialize)]
pub struct SparseFeatBuilder {
    name: String,
    vocabulary_size: usize,
    #[serde(default)]
    embedding_dim: EmbeddingDim,
    #[serde(default)]
    use_hash: bool,
    #[serde(default = "DType::sparse_default")]
    dtype: DType,
    #[serde(default)]
    embedding_name: Option<String>,
    #[serde(default)]
    group_name: Option<String>,
}

impl SparseFeatBuilder {
    /// Creates a new builder.
    pub fn new(name: impl Into<String>, vocabulary_size: usize) -> Self {
        Self {
            name: name.into(),
            vocabulary_size,
            embedding_dim: EmbeddingDim::default(),
            use_hash: false,
            dtype: DType::sparse_default(),
            embedding_name: None,
            group_name: None,
        }
    }

    /// Sets the embedding dimension.
    pub fn embedding_dim(mut self, embedding_dim: impl Into<EmbeddingDim>) -> Self {
        self.embedding_dim = embedding_dim.into();
        self
    }

    /// Requests hashing on the fly.
    pub fn use_hash(mut self, use_hash: bool) -> Self {
        self.use_hash = use_hash;
        self
    }

    /// Sets the declared dtype.
    pub fn dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Sets the embedding table name, tying parameters with other features.
    pub fn embedding_name(mut self, embedding_name: impl Into<String>) -> Self {
        self.embedding_name = Some(embedding_name.into());
        self
    }

    /// Sets the group name.
    pub fn group_name(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    /// Validates the settings and builds the feature.
    pub fn build(self) -> Result<SparseFeat> {
        require_name("SparseFeat", &self.name)?;
        if self.vocabulary_size == 0 {
            return Err(CoreError::config(format!(
                "SparseFeat `{}` must have a positive vocabulary_size",
                self.name
            )));
        }
        let embedding_dim = self.embedding_dim.resolve(self.vocabulary_size);
        if embedding_dim == 0 {
            return Err(CoreError::config(format!(
                "SparseFeat `{}` must have a positive embedding_dim",
                self.name
            )));
        }
        if self.use_hash {
            tracing::warn!(
                feature = %self.name,
                "Feature hashing on the fly is not supported; lookups of this feature will fail"
            );
        }

        let embedding_name = self.embedding_name.unwrap_or_else(|| self.name.clone());
        if embedding_name.is_empty() {
            return Err(CoreError::config(format!(
                "SparseFeat `{}` has an empty embedding_name",
                self.name
            )));
        }

        Ok(SparseFeat {
            name: self.name,
            vocabulary_size: self.vocabulary_size,
            embedding_dim,
            use_hash: self.use_hash,
            dtype: self.dtype,
            embedding_name,
            group_name: self
                .group_name
                .unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string()),
        })
    }
}

impl TryFrom<SparseFeatBuilder> for SparseFeat {
    type Error = CoreError;

    fn try_from(builder: SparseFeatBuilder) -> Result<Self> {
        builder.build()
    }
}

/// A dense numeric feature of fixed width.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDenseFeat")]
pub struct DenseFeat {
    name: String,
    dimension: usize,
    dtype: DType,
}

impl DenseFeat {
    /// Creates a dense feature of the given width with dtype `float32`.
    pub fn new(name: impl Into<String>, dimension: usize) -> Result<Self> {
        let name = name.into();
        require_name("DenseFeat", &name)?;
        if dimension == 0 {
            return Err(CoreError::config(format!(
                "DenseFeat `{name}` must have a positive dimension"
            )));
        }
        Ok(Self {
            name,
            dimension,
            dtype: DType::dense_default(),
        })
    }

    /// Returns a copy with the declared dtype replaced.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Returns the feature name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the width of the feature.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the declared input dtype.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }
}

impl PartialEq for DenseFeat {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DenseFeat {}

impl Hash for DenseFeat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

fn default_dimension() -> usize {
    1
}

#[derive(Deserialize)]
struct RawDenseFeat {
    name: String,
    #[serde(default = "default_dimension")]
    dimension: usize,
    #[serde(default = "DType::dense_default")]
    dtype: DType,
}

impl TryFrom<RawDenseFeat> for DenseFeat {
    type Error = CoreError;

    fn try_from(raw: RawDenseFeat) -> Result<Self> {
        Ok(DenseFeat::new(raw.name, raw.dimension)?.with_dtype(raw.dtype))
    }
}

/// A padded sequence of sparse indices pooled into one embedding.
///
/// Wraps a [`SparseFeat`] and forwards its attributes. Index `0` is the
/// padding value unless a length field is declared.
///
/// # Examples
///
/// ```
/// use deepctr_core::feature::{Combiner, SparseFeat, VarLenSparseFeat};
///
/// let hist = SparseFeat::new("hist", 100, 8).unwrap();
/// let feat = VarLenSparseFeat::new(hist, 5, Combiner::Sum, None).unwrap();
/// assert_eq!(feat.name(), "hist");
/// assert_eq!(feat.embedding_dim(), 8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawVarLenSparseFeat")]
pub struct VarLenSparseFeat {
    sparsefeat: SparseFeat,
    maxlen: usize,
    combiner: Combiner,
    length_name: Option<String>,
}

impl VarLenSparseFeat {
    /// Creates a variable-length feature around `sparsefeat`.
    ///
    /// `length_name`, when given, names an extra input column holding the
    /// number of valid positions of each example.
    pub fn new(
        sparsefeat: SparseFeat,
        maxlen: usize,
        combiner: Combiner,
        length_name: Option<String>,
    ) -> Result<Self> {
        if maxlen == 0 {
            return Err(CoreError::config(format!(
                "VarLenSparseFeat `{}` must have a positive maxlen",
                sparsefeat.name()
            )));
        }
        if let Some(length_name) = &length_name {
            if length_name.is_empty() || length_name == sparsefeat.name() {
                return Err(CoreError::config(format!(
                    "VarLenSparseFeat `{}` has an invalid length_name `{length_name}`",
                    sparsefeat.name()
                )));
            }
        }
        Ok(Self {
            sparsefeat,
            maxlen,
            combiner,
            length_name,
        })
    }

    /// Returns the wrapped sparse descriptor.
    #[inline]
    pub fn sparsefeat(&self) -> &SparseFeat {
        &self.sparsefeat
    }

    /// Returns the padded sequence length.
    #[inline]
    pub fn maxlen(&self) -> usize {
        self.maxlen
    }

    /// Returns the pooling strategy.
    #[inline]
    pub fn combiner(&self) -> Combiner {
        self.combiner
    }

    /// Returns the name of the length column, if any.
    #[inline]
    pub fn length_name(&self) -> Option<&str> {
        self.length_name.as_deref()
    }

    /// Returns the feature name.
    #[inline]
    pub fn name(&self) -> &str {
        self.sparsefeat.name()
    }

    /// Returns the vocabulary size of the wrapped feature.
    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.sparsefeat.vocabulary_size()
    }

    /// Returns the embedding dimension of the wrapped feature.
    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.sparsefeat.embedding_dim()
    }

    /// Returns the declared dtype of the wrapped feature.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.sparsefeat.dtype()
    }

    /// Returns the embedding table name of the wrapped feature.
    #[inline]
    pub fn embedding_name(&self) -> &str {
        self.sparsefeat.embedding_name()
    }

    /// Returns the group name of the wrapped feature.
    #[inline]
    pub fn group_name(&self) -> &str {
        self.sparsefeat.group_name()
    }

    /// Returns whether the wrapped feature requested hashing on the fly.
    #[inline]
    pub fn use_hash(&self) -> bool {
        self.sparsefeat.use_hash()
    }
}

impl PartialEq for VarLenSparseFeat {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for VarLenSparseFeat {}

impl Hash for VarLenSparseFeat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

#[derive(Deserialize)]
struct RawVarLenSparseFeat {
    sparsefeat: SparseFeat,
    maxlen: usize,
    #[serde(default)]
    combiner: Combiner,
    #[serde(default)]
    length_name: Option<String>,
}

impl TryFrom<RawVarLenSparseFeat> for VarLenSparseFeat {
    type Error = CoreError;

    fn try_from(raw: RawVarLenSparseFeat) -> Result<Self> {
        VarLenSparseFeat::new(raw.sparsefeat, raw.maxlen, raw.combiner, raw.length_name)
    }
}

/// Any feature descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureColumn {
    /// A sparse categorical feature.
    Sparse(SparseFeat),
    /// A dense numeric feature.
    Dense(DenseFeat),
    /// A variable-length sparse sequence feature.
    #[serde(rename = "varlen_sparse")]
    VarLenSparse(VarLenSparseFeat),
}

impl FeatureColumn {
    /// Tags accepted in the `type` field of a serialized column.
    pub const KINDS: [&'static str; 3] = ["sparse", "dense", "varlen_sparse"];

    /// Returns the feature name.
    pub fn name(&self) -> &str {
        match self {
            FeatureColumn::Sparse(feat) => feat.name(),
            FeatureColumn::Dense(feat) => feat.name(),
            FeatureColumn::VarLenSparse(feat) => feat.name(),
        }
    }

    /// Returns the serialized kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureColumn::Sparse(_) => "sparse",
            FeatureColumn::Dense(_) => "dense",
            FeatureColumn::VarLenSparse(_) => "varlen_sparse",
        }
    }

    /// Returns the sparse descriptor, if this is one.
    pub fn as_sparse(&self) -> Option<&SparseFeat> {
        match self {
            FeatureColumn::Sparse(feat) => Some(feat),
            _ => None,
        }
    }

    /// Returns the dense descriptor, if this is one.
    pub fn as_dense(&self) -> Option<&DenseFeat> {
        match self {
            FeatureColumn::Dense(feat) => Some(feat),
            _ => None,
        }
    }

    /// Returns the variable-length descriptor, if this is one.
    pub fn as_varlen_sparse(&self) -> Option<&VarLenSparseFeat> {
        match self {
            FeatureColumn::VarLenSparse(feat) => Some(feat),
            _ => None,
        }
    }
}

impl From<SparseFeat> for FeatureColumn {
    fn from(feat: SparseFeat) -> Self {
        FeatureColumn::Sparse(feat)
    }
}

impl From<DenseFeat> for FeatureColumn {
    fn from(feat: DenseFeat) -> Self {
        FeatureColumn::Dense(feat)
    }
}

impl From<VarLenSparseFeat> for FeatureColumn {
    fn from(feat: VarLenSparseFeat) -> Self {
        FeatureColumn::VarLenSparse(feat)
    }
}

/// Returns the sparse descriptors in declaration order.
pub fn sparse_feature_columns(columns: &[FeatureColumn]) -> Vec<&SparseFeat> {
    columns.iter().filter_map(FeatureColumn::as_sparse).collect()
}

/// Returns the dense descriptors in declaration order.
pub fn dense_feature_columns(columns: &[FeatureColumn]) -> Vec<&DenseFeat> {
    columns.iter().filter_map(FeatureColumn::as_dense).collect()
}

/// Returns the variable-length descriptors in declaration order.
pub fn varlen_sparse_feature_columns(columns: &[FeatureColumn]) -> Vec<&VarLenSparseFeat> {
    columns
        .iter()
        .filter_map(FeatureColumn::as_varlen_sparse)
        .collect()
}
