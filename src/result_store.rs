//! Persisting the records of a sweep as a JSON document, and reading
//! them back.
//!
//! Two shapes exist, and which one a file has is implied by the sweep
//! that wrote it: a flat array of records (throughput sweeps), or an
//! object mapping the distance to the array of records measured at
//! that distance (loss sweeps). JSON object keys are text, so the
//! distance keys are parsed back to integers when loading.

use std::{collections::BTreeMap, path::Path, str::FromStr};

use serde_json::Value;

use crate::{
    io_utils::write_atomically::{write_atomically, WriteAtomicallyError},
    record::TaggedRecord,
};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("reading result file {path:?}: {error}")]
    Io {
        path: String,
        error: std::io::Error,
    },
    #[error("result file {path:?} is not valid JSON: {error}")]
    Syntax {
        path: String,
        error: serde_json::Error,
    },
    #[error("decoding result file {path:?}: {error}")]
    Json {
        path: String,
        error: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("encoding results: {0}")]
    Encode(serde_json::Error),
    #[error("writing result file: {0}")]
    Write(#[from] WriteAtomicallyError),
    #[error("result file {path:?} contains {found}, expected {expected}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("result file {path:?} has a distance key that is not an integer: {key:?}")]
    DistanceKey { path: String, key: String },
}

/// All records of one sweep, in enumeration order
#[derive(Debug, Clone, PartialEq)]
pub enum ResultCollection {
    Flat(Vec<TaggedRecord>),
    ByDistance(BTreeMap<u64, Vec<TaggedRecord>>),
}

impl ResultCollection {
    /// A grouped collection with an empty group for each of the
    /// given distances, so that distances without any surviving
    /// record still show up in the persisted file.
    pub fn by_distance(distances: &[u64]) -> Self {
        ResultCollection::ByDistance(distances.iter().map(|d| (*d, Vec::new())).collect())
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            ResultCollection::Flat(_) => FLAT,
            ResultCollection::ByDistance(_) => BY_DISTANCE,
        }
    }

    /// Append a record. For grouped collections, the group is chosen
    /// by the record's own distance tag, which hence must be present.
    pub fn push(&mut self, record: TaggedRecord) {
        match self {
            ResultCollection::Flat(records) => records.push(record),
            ResultCollection::ByDistance(groups) => {
                let distance = record
                    .distance
                    .expect("records of grouped sweeps carry their distance");
                groups.entry(distance).or_default().push(record);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResultCollection::Flat(records) => records.len(),
            ResultCollection::ByDistance(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records with the distance they are filed under: the
    /// record's tag for flat collections, the group key for grouped
    /// ones. `None` if a flat record has no distance tag.
    pub fn records_with_distance(
        &self,
    ) -> Box<dyn Iterator<Item = (Option<u64>, &TaggedRecord)> + '_> {
        match self {
            ResultCollection::Flat(records) => {
                Box::new(records.iter().map(|record| (record.distance, record)))
            }
            ResultCollection::ByDistance(groups) => Box::new(
                groups
                    .iter()
                    .flat_map(|(distance, records)| records.iter().map(|r| (Some(*distance), r))),
            ),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let s = match self {
            ResultCollection::Flat(records) => serde_json::to_string(records),
            // serde_json writes the integer keys as strings, in
            // numeric order
            ResultCollection::ByDistance(groups) => serde_json::to_string(groups),
        }
        .map_err(PersistenceError::Encode)?;
        write_atomically(path, s)?;
        Ok(())
    }

    /// Load a file of either shape.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let path_string = || path.to_string_lossy().into_owned();
        let s = std::fs::read_to_string(path).map_err(|error| PersistenceError::Io {
            path: path_string(),
            error,
        })?;
        let value: Value = serde_json::from_str(&s).map_err(|error| PersistenceError::Syntax {
            path: path_string(),
            error,
        })?;
        let json_error = |error| PersistenceError::Json {
            path: path_string(),
            error,
        };
        match value {
            Value::Array(_) => Ok(ResultCollection::Flat(
                serde_path_to_error::deserialize(value).map_err(json_error)?,
            )),
            Value::Object(_) => {
                let groups: BTreeMap<String, Vec<TaggedRecord>> =
                    serde_path_to_error::deserialize(value).map_err(json_error)?;
                let groups = groups
                    .into_iter()
                    .map(|(key, records)| match u64::from_str(key.trim()) {
                        Ok(distance) => Ok((distance, records)),
                        Err(_) => Err(PersistenceError::DistanceKey {
                            path: path_string(),
                            key,
                        }),
                    })
                    .collect::<Result<_, _>>()?;
                Ok(ResultCollection::ByDistance(groups))
            }
            _ => Err(PersistenceError::ShapeMismatch {
                path: path_string(),
                expected: "a list or an object",
                found: "a JSON scalar",
            }),
        }
    }

    /// Load a file that must be a flat array of records
    pub fn load_flat(path: &Path) -> Result<Vec<TaggedRecord>, PersistenceError> {
        match Self::load(path)? {
            ResultCollection::Flat(records) => Ok(records),
            other => Err(PersistenceError::ShapeMismatch {
                path: path.to_string_lossy().into_owned(),
                expected: FLAT,
                found: other.shape_name(),
            }),
        }
    }

    /// Load a file that must map distances to records
    pub fn load_by_distance(
        path: &Path,
    ) -> Result<BTreeMap<u64, Vec<TaggedRecord>>, PersistenceError> {
        match Self::load(path)? {
            ResultCollection::ByDistance(groups) => Ok(groups),
            other => Err(PersistenceError::ShapeMismatch {
                path: path.to_string_lossy().into_owned(),
                expected: BY_DISTANCE,
                found: other.shape_name(),
            }),
        }
    }
}

const FLAT: &str = "a flat list of records";
const BY_DISTANCE: &str = "records grouped by distance";

#[cfg(test)]
mod tests {
    use crate::simulator::RawObservation;

    use super::*;

    fn record(distance: u64, throughput: f64) -> TaggedRecord {
        TaggedRecord {
            distance: Some(distance),
            size: None,
            height: 100,
            interval: Some(10),
            count: Some(100),
            throughput,
            arrived: Some(50.0),
            command_line: vec![],
            raw_data: RawObservation::default(),
        }
    }

    #[test]
    fn t_push_groups_by_distance() {
        let mut c = ResultCollection::by_distance(&[3, 6, 12]);
        c.push(record(6, 1.0));
        c.push(record(3, 2.0));
        c.push(record(6, 3.0));
        assert_eq!(c.len(), 3);
        let ResultCollection::ByDistance(groups) = &c else {
            panic!()
        };
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), [3, 6, 12]);
        assert_eq!(groups[&6].len(), 2);
        assert!(groups[&12].is_empty());

        let distances: Vec<_> = c.records_with_distance().map(|(d, _)| d).collect();
        assert_eq!(distances, [Some(3), Some(6), Some(6)]);
    }

    #[test]
    fn t_grouped_json_keys_in_numeric_order() {
        let mut c = ResultCollection::by_distance(&[100, 12, 3]);
        c.push(record(12, 1.0));
        let ResultCollection::ByDistance(groups) = &c else {
            panic!()
        };
        let s = serde_json::to_string(groups).unwrap();
        assert!(s.starts_with(r#"{"3":[],"12":[{"#), "{s}");
    }
}
