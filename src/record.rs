//! The unit that sweeps produce, persist and reshapes consume: one
//! simulator result annotated with the parameters that produced it
//! and the metrics derived from it.

use std::{fmt::Display, str::FromStr};

use anyhow::bail;

use crate::simulator::RawObservation;

/// The parameter tags a record can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Distance,
    Size,
    Height,
    Interval,
    Count,
}

impl Tag {
    /// The name used for the sweep axis, and for the field in the
    /// persisted record
    pub fn name(self) -> &'static str {
        match self {
            Tag::Distance => "distance",
            Tag::Size => "size",
            Tag::Height => "height",
            Tag::Interval => "interval",
            Tag::Count => "count",
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The derived metrics a record can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// kB/s
    Throughput,
    /// Percentage of sent packets that arrived
    Arrived,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Throughput => "throughput",
            Metric::Arrived => "arrived",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "throughput" => Ok(Metric::Throughput),
            "arrived" => Ok(Metric::Arrived),
            _ => bail!("unknown metric {s:?}, expecting \"throughput\" or \"arrived\""),
        }
    }
}

/// Immutable once created. Tags that a sweep kind does not vary are
/// absent (and not persisted).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaggedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub height: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    pub throughput: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrived: Option<f64>,

    pub command_line: Vec<String>,
    pub raw_data: RawObservation,
}

impl TaggedRecord {
    pub fn tag(&self, tag: Tag) -> Option<u64> {
        match tag {
            Tag::Distance => self.distance,
            Tag::Size => self.size,
            Tag::Height => Some(self.height),
            Tag::Interval => self.interval,
            Tag::Count => self.count,
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Throughput => Some(self.throughput),
            Metric::Arrived => self.arrived,
        }
    }
}
