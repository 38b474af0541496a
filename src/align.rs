//! Aligning independently loaded result sets onto one shared distance
//! axis, for overlaying them in a comparison.
//!
//! For flat collections the last record at a distance wins, as in the
//! matrix reshape; for grouped collections only the first record of
//! each group is used. Distances without any record keep the sentinel
//! 0.

use crate::{
    chart::{Chart, Series, DISTANCE_LABEL},
    record::{Metric, TaggedRecord},
    reshape::{Distances, ReshapeError},
    result_store::ResultCollection,
};

pub const ALIGN_SENTINEL: f64 = 0.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AlignError {
    #[error(
        "need the same number of throughput files ({tcp}), \
         loss files ({udp}) and titles ({titles})"
    )]
    LengthMismatch { tcp: usize, udp: usize, titles: usize },
    #[error("series {label:?}: {error}")]
    Series { label: String, error: ReshapeError },
}

/// One value per canonical distance.
pub fn align_series(
    collection: &ResultCollection,
    distances: &Distances,
    metric: Metric,
) -> Result<Vec<f64>, ReshapeError> {
    let mut values = distances.row(ALIGN_SENTINEL);
    let mut set = |distance: u64, record: &TaggedRecord| -> Result<(), ReshapeError> {
        values[distances.column(distance)?] = record
            .metric(metric)
            .ok_or(ReshapeError::MissingMetric(metric))?;
        Ok(())
    };
    match collection {
        ResultCollection::Flat(records) => {
            for record in records {
                set(record.distance.ok_or(ReshapeError::MissingDistance)?, record)?;
            }
        }
        ResultCollection::ByDistance(groups) => {
            for (distance, records) in groups {
                if let Some(first) = records.first() {
                    set(*distance, first)?;
                }
            }
        }
    }
    Ok(values)
}

/// The inputs of a multi-panel throughput comparison: panel `i`
/// overlays `tcp[i]`, `udp[i]` and the shared `baseline`.
pub struct Comparison<'t> {
    pub tcp: &'t [ResultCollection],
    pub udp: &'t [ResultCollection],
    pub baseline: &'t ResultCollection,
    pub titles: &'t [String],
}

pub const TCP_LABEL: &str = "TCP";
pub const UDP_LABEL: &str = "UDP";
pub const BASELINE_LABEL: &str = "UDP (OLSR)";

impl<'t> Comparison<'t> {
    pub fn panels(&self, distances: &Distances) -> Result<Vec<Chart>, AlignError> {
        let Comparison {
            tcp,
            udp,
            baseline,
            titles,
        } = self;
        if tcp.len() != udp.len() || tcp.len() != titles.len() {
            return Err(AlignError::LengthMismatch {
                tcp: tcp.len(),
                udp: udp.len(),
                titles: titles.len(),
            });
        }

        let series = |label: &str, collection: &ResultCollection| {
            align_series(collection, distances, Metric::Throughput)
                .map(|values| Series {
                    label: label.into(),
                    values,
                })
                .map_err(|error| AlignError::Series {
                    label: label.into(),
                    error,
                })
        };

        let baseline = series(BASELINE_LABEL, *baseline)?;
        tcp.iter()
            .zip(udp.iter())
            .zip(titles.iter())
            .map(|((tcp, udp), title)| -> Result<Chart, AlignError> {
                Ok(Chart {
                    title: title.clone(),
                    x_label: DISTANCE_LABEL.into(),
                    y_label: "Throughput (kB/s)".into(),
                    x: distances.as_slice().iter().map(|d| *d as f64).collect(),
                    series: vec![
                        series(TCP_LABEL, tcp)?,
                        series(UDP_LABEL, udp)?,
                        baseline.clone(),
                    ],
                })
            })
            .collect()
    }
}
