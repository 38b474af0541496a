//! Reshaping a collection of tagged records into a dense matrix: one
//! row per bucket of an `IndexMap`, one column per canonical
//! distance.
//!
//! Cells that no record contributes to keep the sentinel chosen by
//! the caller (e.g. 0 for throughput, 100 for an arrival percentage
//! where 0 would be a meaningful value). This is independent of the
//! zero-result filter applied when running the sweep: a cell is empty
//! whether its run was filtered or never happened.

use crate::{
    index_map::{IndexMap, IndexMapError},
    record::{Metric, Tag, TaggedRecord},
    result_store::ResultCollection,
};

pub const STANDARD_DISTANCES: &[u64] = &[3, 6, 12, 25, 75, 100, 150, 200, 400, 600];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ReshapeError {
    #[error(transparent)]
    IndexMap(#[from] IndexMapError),
    #[error("distance {0} is not on the distance axis")]
    UnknownDistance(u64),
    #[error("record without a distance in a flat collection")]
    MissingDistance,
    #[error("record does not carry the metric {0:?}")]
    MissingMetric(Metric),
}

/// The canonical x-axis, in plotting order
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Distances(Vec<u64>);

impl Default for Distances {
    fn default() -> Self {
        Self(STANDARD_DISTANCES.to_vec())
    }
}

impl From<Vec<u64>> for Distances {
    fn from(v: Vec<u64>) -> Self {
        Self(v)
    }
}

impl Distances {
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Linear search; the first position wins.
    pub fn column(&self, distance: u64) -> Result<usize, ReshapeError> {
        self.0
            .iter()
            .position(|d| *d == distance)
            .ok_or(ReshapeError::UnknownDistance(distance))
    }

    /// A row with `fill` at every distance
    pub fn row(&self, fill: f64) -> Vec<f64> {
        vec![fill; self.0.len()]
    }
}

/// Only use records whose `tag` has the given `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordFilter {
    pub tag: Tag,
    pub value: u64,
}

impl RecordFilter {
    pub fn matches(&self, record: &TaggedRecord) -> bool {
        record.tag(self.tag) == Some(self.value)
    }
}

/// Rows in bucket order, each with one value per distance.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResultMatrix {
    pub distances: Vec<u64>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct Reshape<'t> {
    pub distances: &'t Distances,
    pub index_map: &'t IndexMap,
    pub metric: Metric,
    pub sentinel: f64,
    pub filter: Option<RecordFilter>,
}

impl<'t> Reshape<'t> {
    /// When several records land in the same cell, the one coming
    /// later in the collection overwrites the earlier.
    pub fn run(&self, collection: &ResultCollection) -> Result<ResultMatrix, ReshapeError> {
        let Reshape {
            distances,
            index_map,
            metric,
            sentinel,
            filter,
        } = self;
        let mut rows: Vec<Vec<f64>> = (0..index_map.len())
            .map(|_| distances.row(*sentinel))
            .collect();

        for (distance, record) in collection.records_with_distance() {
            if let Some(filter) = filter {
                if !filter.matches(record) {
                    continue;
                }
            }
            let bucket = index_map.bucket_of(record)?;
            let column = distances.column(distance.ok_or(ReshapeError::MissingDistance)?)?;
            let value = record
                .metric(*metric)
                .ok_or(ReshapeError::MissingMetric(*metric))?;
            rows[bucket][column] = value;
        }

        Ok(ResultMatrix {
            distances: distances.as_slice().to_owned(),
            rows,
        })
    }
}
