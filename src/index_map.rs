//! Mapping of two categorical record tags (e.g. height and payload
//! size) to the linear index of an output bucket, i.e. a row of a
//! reshaped matrix.
//!
//! The table is explicit and checked at construction: bucket indices
//! are unique and dense (0..n). A record whose tag pair is not in the
//! table is a configuration mismatch between the sweep and the
//! reshape, and is reported as an error, never skipped.

use std::collections::BTreeMap;

use crate::record::{Tag, TaggedRecord};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IndexMapError {
    #[error("no bucket for {outer_tag}={outer}, {inner_tag}={inner}")]
    Unmapped {
        outer_tag: Tag,
        outer: u64,
        inner_tag: Tag,
        inner: u64,
    },
    #[error("record does not carry the tag {0:?}")]
    MissingTag(Tag),
    #[error("bucket index {0} is used for more than one pair")]
    DuplicateIndex(usize),
    #[error("the pair ({0}, {1}) is given more than once")]
    DuplicatePair(u64, u64),
    #[error("bucket indices are not dense, index {0} is missing")]
    NotDense(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMap {
    outer_tag: Tag,
    inner_tag: Tag,
    table: BTreeMap<(u64, u64), usize>,
    /// The pair for each bucket, in bucket order
    buckets: Vec<(u64, u64)>,
}

impl IndexMap {
    pub fn new(
        outer_tag: Tag,
        inner_tag: Tag,
        entries: impl IntoIterator<Item = ((u64, u64), usize)>,
    ) -> Result<Self, IndexMapError> {
        let mut table = BTreeMap::new();
        let mut by_index: BTreeMap<usize, (u64, u64)> = BTreeMap::new();
        for (pair, index) in entries {
            if table.insert(pair, index).is_some() {
                return Err(IndexMapError::DuplicatePair(pair.0, pair.1));
            }
            if by_index.insert(index, pair).is_some() {
                return Err(IndexMapError::DuplicateIndex(index));
            }
        }
        let mut buckets = Vec::with_capacity(by_index.len());
        for (expected, (index, pair)) in by_index.into_iter().enumerate() {
            if index != expected {
                return Err(IndexMapError::NotDense(expected));
            }
            buckets.push(pair);
        }
        Ok(Self {
            outer_tag,
            inner_tag,
            table,
            buckets,
        })
    }

    /// Nested two-level form: outer value -> inner value -> index.
    pub fn from_nested(
        outer_tag: Tag,
        inner_tag: Tag,
        nested: &[(u64, &[(u64, usize)])],
    ) -> Result<Self, IndexMapError> {
        Self::new(
            outer_tag,
            inner_tag,
            nested.iter().flat_map(|(outer, inners)| {
                inners
                    .iter()
                    .map(move |(inner, index)| ((*outer, *inner), *index))
            }),
        )
    }

    /// Every combination of the given values, numbered with the
    /// outer value changing slowest: `outer_pos * inner_values.len() +
    /// inner_pos`.
    pub fn product(
        outer_tag: Tag,
        outer_values: &[u64],
        inner_tag: Tag,
        inner_values: &[u64],
    ) -> Result<Self, IndexMapError> {
        Self::new(
            outer_tag,
            inner_tag,
            outer_values.iter().enumerate().flat_map(|(i, outer)| {
                inner_values
                    .iter()
                    .enumerate()
                    .map(move |(j, inner)| ((*outer, *inner), i * inner_values.len() + j))
            }),
        )
    }

    pub fn outer_tag(&self) -> Tag {
        self.outer_tag
    }

    pub fn inner_tag(&self) -> Tag {
        self.inner_tag
    }

    /// The number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The (outer, inner) pair of each bucket, in bucket order
    pub fn buckets(&self) -> &[(u64, u64)] {
        &self.buckets
    }

    pub fn index_of(&self, outer: u64, inner: u64) -> Result<usize, IndexMapError> {
        self.table
            .get(&(outer, inner))
            .copied()
            .ok_or(IndexMapError::Unmapped {
                outer_tag: self.outer_tag,
                outer,
                inner_tag: self.inner_tag,
                inner,
            })
    }

    pub fn bucket_of(&self, record: &TaggedRecord) -> Result<usize, IndexMapError> {
        let outer = record
            .tag(self.outer_tag)
            .ok_or(IndexMapError::MissingTag(self.outer_tag))?;
        let inner = record
            .tag(self.inner_tag)
            .ok_or(IndexMapError::MissingTag(self.inner_tag))?;
        self.index_of(outer, inner)
    }

    /// One label per bucket, in bucket order
    pub fn labels(&self, label: impl Fn(u64, u64) -> String) -> Vec<String> {
        self.buckets
            .iter()
            .map(|(outer, inner)| label(*outer, *inner))
            .collect()
    }
}

/// Byte counts in decimal units as used for the payload sizes,
/// e.g. "10kB", "1MB", "20MB"; other values as plain bytes.
pub fn format_bytes(n: u64) -> String {
    const UNITS: &[(u64, &str)] = &[(1_000_000_000, "GB"), (1_000_000, "MB"), (1_000, "kB")];
    for (factor, unit) in UNITS {
        if n >= *factor && n % factor == 0 {
            return format!("{}{unit}", n / factor);
        }
    }
    format!("{n}B")
}

pub fn height_size_label(height: u64, size: u64) -> String {
    format!("Height = {height}m, {}", format_bytes(size))
}

pub fn interval_count_label(interval: u64, count: u64) -> String {
    format!("{count} Packets every {interval}ms")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn height_size() -> IndexMap {
        IndexMap::product(Tag::Height, &[1, 100], Tag::Size, &[10000, 1000000, 20000000])
            .unwrap()
    }

    #[test]
    fn t_product_matches_nested() {
        let nested = IndexMap::from_nested(
            Tag::Height,
            Tag::Size,
            &[
                (1, &[(10000, 0), (1000000, 1), (20000000, 2)]),
                (100, &[(10000, 3), (1000000, 4), (20000000, 5)]),
            ],
        )
        .unwrap();
        assert_eq!(nested, height_size());
        assert_eq!(nested.len(), 6);
        assert_eq!(nested.index_of(100, 1000000), Ok(4));
    }

    #[test]
    fn t_unmapped_fails() {
        assert_eq!(
            height_size().index_of(50, 10000),
            Err(IndexMapError::Unmapped {
                outer_tag: Tag::Height,
                outer: 50,
                inner_tag: Tag::Size,
                inner: 10000,
            })
        );
    }

    #[test]
    fn t_invalid_tables() {
        assert_eq!(
            IndexMap::new(Tag::Interval, Tag::Count, [((10, 10), 0), ((10, 100), 2)]),
            Err(IndexMapError::NotDense(1))
        );
        assert_eq!(
            IndexMap::new(Tag::Interval, Tag::Count, [((10, 10), 0), ((10, 100), 0)]),
            Err(IndexMapError::DuplicateIndex(0))
        );
        assert_eq!(
            IndexMap::new(Tag::Interval, Tag::Count, [((10, 10), 0), ((10, 10), 1)]),
            Err(IndexMapError::DuplicatePair(10, 10))
        );
    }

    #[test]
    fn t_labels() {
        assert_eq!(
            height_size().labels(height_size_label),
            [
                "Height = 1m, 10kB",
                "Height = 1m, 1MB",
                "Height = 1m, 20MB",
                "Height = 100m, 10kB",
                "Height = 100m, 1MB",
                "Height = 100m, 20MB",
            ]
        );
        assert_eq!(interval_count_label(10, 1000), "1000 Packets every 10ms");
        assert_eq!(format_bytes(1500), "1500B");
    }
}
