//! The composite key exchanged through the shuffle.
//!
//! A [`CompositeKey`] pairs a grouping field with a tag. Keys order first by `group` and then by
//! `tag`, so records that share a group are contiguous after sorting and, inside that run, are
//! ordered by tag. Giving dimension records a smaller tag than fact records is what places the
//! single dimension record at the head of its group.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag carried by dimension records; sorts before every fact record of the same group.
pub const DIMENSION_TAG: i32 = 1;
/// Tag carried by fact records.
pub const FACT_TAG: i32 = 2;

/// A `(group, tag)` pair, ordered lexicographically.
///
/// The derived `Ord` relies on the field order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CompositeKey {
    /// The grouping field; the only input to partitioning and grouping.
    pub group: i32,
    /// Orders records within a group.
    pub tag: i32,
}

impl CompositeKey {
    /// Constructs a key from its grouping field and tag.
    #[inline]
    pub fn new(group: i32, tag: i32) -> Self {
        CompositeKey { group, tag }
    }
    /// Key for a dimension record of `group`.
    #[inline]
    pub fn dimension(group: i32) -> Self {
        Self::new(group, DIMENSION_TAG)
    }
    /// Key for a fact record of `group`.
    #[inline]
    pub fn fact(group: i32) -> Self {
        Self::new(group, FACT_TAG)
    }
    /// True if the key carries [`DIMENSION_TAG`].
    #[inline]
    pub fn is_dimension(&self) -> bool {
        self.tag == DIMENSION_TAG
    }
}

/// Full-key comparison: by `group`, then by `tag`.
#[inline]
pub fn compare(k1: &CompositeKey, k2: &CompositeKey) -> Ordering {
    k1.group.cmp(&k2.group).then(k1.tag.cmp(&k2.tag))
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.group, self.tag)
    }
}
