//! Throughput as a function of the packet arrival percentage, over
//! all records of a loss sweep.

use std::collections::BTreeMap;

use noisy_float::types::R64;

use crate::{
    chart::{Chart, Series},
    record::Metric,
    reshape::ReshapeError,
    result_store::ResultCollection,
};

/// Points sorted by arrival percentage. Of records with an identical
/// arrival percentage, the last one in the collection is kept.
/// Records with a non-finite arrival percentage are skipped.
pub fn arrival_throughput_curve(
    collection: &ResultCollection,
) -> Result<Vec<(f64, f64)>, ReshapeError> {
    let mut points: BTreeMap<R64, f64> = BTreeMap::new();
    for (_, record) in collection.records_with_distance() {
        let arrived = record
            .metric(Metric::Arrived)
            .ok_or(ReshapeError::MissingMetric(Metric::Arrived))?;
        if let Some(arrived) = R64::try_new(arrived) {
            points.insert(arrived, record.throughput);
        }
    }
    Ok(points
        .into_iter()
        .map(|(arrived, throughput)| (arrived.raw(), throughput))
        .collect())
}

pub fn arrival_throughput_chart(points: Vec<(f64, f64)>) -> Chart {
    let (x, values) = points.into_iter().unzip();
    Chart {
        title: "Throughput by packet arrival".into(),
        x_label: "Packets arrived at receiver (%)".into(),
        y_label: "Throughput (kB/s)".into(),
        x,
        series: vec![Series {
            label: "UDP".into(),
            values,
        }],
    }
}
