//! Feature layout: where each feature lives inside a flat input row.
//!
//! [`build_input_features`] walks the descriptors in order and hands out
//! contiguous half-open column ranges. The resulting [`FeatureIndex`] is what
//! the lookup and pooling code uses to slice an input batch.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::feature::FeatureColumn;

/// A half-open column range `[start, end)` within a flat input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRange {
    /// First column (inclusive).
    pub start: usize,
    /// Last column (exclusive).
    pub end: usize,
}

impl FeatureRange {
    /// Creates a range.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Returns the number of columns covered.
    #[inline]
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// Returns the range as a [`Range<usize>`].
    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<FeatureRange> for (usize, usize) {
    fn from(range: FeatureRange) -> Self {
        (range.start, range.end)
    }
}

/// Ordered mapping from feature name to its column range.
///
/// # Examples
///
/// ```
/// use deepctr_core::feature::{DenseFeat, FeatureColumn, SparseFeat};
/// use deepctr_core::layout::build_input_features;
///
/// let columns: Vec<FeatureColumn> = vec![
///     SparseFeat::new("gender", 2, 4).unwrap().into(),
///     DenseFeat::new("age", 1).unwrap().into(),
/// ];
/// let index = build_input_features(&columns);
/// assert_eq!(index.get("gender").map(Into::into), Some((0, 1)));
/// assert_eq!(index.get("age").map(Into::into), Some((1, 2)));
/// assert_eq!(index.total_width(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureIndex {
    entries: Vec<(String, FeatureRange)>,
    positions: HashMap<String, usize>,
}

impl FeatureIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name` with the given width at the current end.
    ///
    /// Returns `false` and leaves the index unchanged if the name is
    /// already assigned.
    fn push(&mut self, name: &str, width: usize) -> bool {
        if self.positions.contains_key(name) {
            return false;
        }
        let start = self.total_width();
        self.positions.insert(name.to_string(), self.entries.len());
        self.entries
            .push((name.to_string(), FeatureRange::new(start, start + width)));
        true
    }

    /// Returns the range assigned to `name`.
    pub fn get(&self, name: &str) -> Option<FeatureRange> {
        self.positions.get(name).map(|&i| self.entries[i].1)
    }

    /// Returns whether `name` has been assigned a range.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Returns the total number of columns covered.
    pub fn total_width(&self) -> usize {
        self.entries.last().map(|(_, range)| range.end).unwrap_or(0)
    }

    /// Returns the number of named entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no feature has been laid out.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the feature names in layout order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates `(name, range)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureRange)> {
        self.entries.iter().map(|(name, range)| (name.as_str(), *range))
    }
}

/// Assigns every feature a contiguous column range.
///
/// Widths are 1 for sparse features, `dimension` for dense features and
/// `maxlen` for variable-length features, followed by one extra column for
/// the length field when declared. A name that is already assigned is
/// skipped and does not consume any columns.
pub fn build_input_features(columns: &[FeatureColumn]) -> FeatureIndex {
    let mut index = FeatureIndex::new();

    for column in columns {
        let assigned = match column {
            FeatureColumn::Sparse(feat) => index.push(feat.name(), 1),
            FeatureColumn::Dense(feat) => index.push(feat.name(), feat.dimension()),
            FeatureColumn::VarLenSparse(feat) => {
                let assigned = index.push(feat.name(), feat.maxlen());
                if assigned {
                    if let Some(length_name) = feat.length_name() {
                        if !index.push(length_name, 1) {
                            tracing::warn!(
                                feature = feat.name(),
                                length_name,
                                "Length field name already assigned; keeping the first range"
                            );
                        }
                    }
                }
                assigned
            }
        };

        if !assigned {
            tracing::warn!(
                feature = column.name(),
                kind = column.kind(),
                "Duplicate feature name ignored; keeping the first declaration"
            );
        }
    }

    tracing::debug!(
        features = index.len(),
        total_width = index.total_width(),
        "Built feature index"
    );
    index
}

/// Returns the feature names of the layout built over `columns`, in order.
///
/// Length fields of variable-length features are included.
pub fn get_feature_names(columns: &[FeatureColumn]) -> Vec<String> {
    build_input_features(columns)
        .names()
        .map(str::to_string)
        .collect()
}
