//! What a sweep varies and how the simulator is called: built-in
//! presets, or loaded from a config file.

use std::path::PathBuf;

use crate::{
    record::Tag,
    reshape::Distances,
    simulator::Flag,
    sweep::{
        axis::{Axes, AxisError, ParameterCombination, SweepAxis},
        derived::DEFAULT_START_OFFSET_MS,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Bulk transfer (TCP by default), one record per run, persisted
    /// as a flat list
    Throughput,
    /// UDP packets sent at a fixed cadence, persisted grouped by
    /// distance
    Loss,
}

pub const DEFAULT_SIMULATOR: &str = "./simulation3";
pub const UDP_SOCKET_FACTORY: &str = "ns3::UdpSocketFactory";
pub const DEFAULT_ROUTING: &str = "olsr";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub kind: SweepKind,

    /// Path to the simulator binary
    #[serde(default = "default_simulator")]
    pub simulator: String,

    /// Simulated milliseconds before the transfer starts
    #[serde(default = "default_start_offset_ms")]
    pub start_offset_ms: u64,

    #[serde(default)]
    pub distances: Distances,

    /// Antenna heights in m
    pub heights: Vec<u64>,

    /// Payload sizes in bytes (throughput sweeps)
    #[serde(default)]
    pub sizes: Vec<u64>,

    /// Packet intervals in ms (loss sweeps)
    #[serde(default)]
    pub intervals: Vec<u64>,

    /// Packet counts (loss sweeps)
    #[serde(default)]
    pub counts: Vec<u64>,

    /// `--maxBytes` for loss sweeps
    #[serde(default = "default_loss_max_bytes")]
    pub loss_max_bytes: u64,

    /// `--socket_factory` for loss sweeps
    #[serde(default = "default_socket_factory")]
    pub socket_factory: String,

    /// Name of a routing mode, passed as a bare flag `--$routing`
    #[serde(default)]
    pub routing: Option<String>,

    /// Where the results are written
    pub output: PathBuf,
}

fn default_simulator() -> String {
    DEFAULT_SIMULATOR.into()
}

fn default_start_offset_ms() -> u64 {
    DEFAULT_START_OFFSET_MS
}

fn default_loss_max_bytes() -> u64 {
    1_000_000
}

fn default_socket_factory() -> String {
    UDP_SOCKET_FACTORY.into()
}

impl SweepConfig {
    /// The full sweep, or, with `comparison`, the single setting
    /// (h=100m, 20MB) used to compare against other transports.
    pub fn preset(kind: SweepKind, comparison: bool, routing: Option<String>) -> Self {
        let mut config = SweepConfig {
            kind,
            simulator: default_simulator(),
            start_offset_ms: DEFAULT_START_OFFSET_MS,
            distances: Distances::default(),
            heights: vec![1, 100],
            sizes: vec![],
            intervals: vec![],
            counts: vec![],
            loss_max_bytes: default_loss_max_bytes(),
            socket_factory: default_socket_factory(),
            routing,
            output: PathBuf::new(),
        };
        if comparison {
            config.heights = vec![100];
        }
        match (kind, comparison) {
            (SweepKind::Throughput, false) => {
                config.sizes = vec![10_000, 1_000_000, 20_000_000];
                config.output = "tcp_tests.json".into();
            }
            (SweepKind::Throughput, true) => {
                config.sizes = vec![20_000_000];
                config.output = "tcp_comparison.json".into();
            }
            (SweepKind::Loss, false) => {
                config.intervals = vec![10, 100];
                config.counts = vec![10, 100, 1000];
                config.output = "udp_loss.json".into();
            }
            (SweepKind::Loss, true) => {
                config.intervals = vec![100];
                config.counts = vec![1000];
                config.loss_max_bytes = 20_000_000;
                config.output = "udp_comparison.json".into();
            }
        }
        config
    }

    /// Outermost first; distance is always the innermost loop.
    pub fn axes(&self) -> Result<Axes, AxisError> {
        let axis = |tag: Tag, values: &[u64]| SweepAxis::new(tag.name(), values);
        let axes = match self.kind {
            SweepKind::Throughput => vec![
                axis(Tag::Height, &self.heights),
                axis(Tag::Size, &self.sizes),
                axis(Tag::Distance, self.distances.as_slice()),
            ],
            SweepKind::Loss => vec![
                axis(Tag::Height, &self.heights),
                axis(Tag::Interval, &self.intervals),
                axis(Tag::Count, &self.counts),
                axis(Tag::Distance, self.distances.as_slice()),
            ],
        };
        Axes::new(axes)
    }

    /// The simulator flags for one combination of `self.axes()`.
    pub fn flags(&self, combination: &ParameterCombination) -> Vec<Flag> {
        let mut flags = vec![Flag::value("height", value(combination, Tag::Height))];
        match self.kind {
            SweepKind::Throughput => {
                flags.push(Flag::value("maxBytes", value(combination, Tag::Size)));
                flags.push(Flag::value("distance", value(combination, Tag::Distance)));
            }
            SweepKind::Loss => {
                flags.push(Flag::value("maxBytes", self.loss_max_bytes));
                flags.push(Flag::value("distance", value(combination, Tag::Distance)));
                flags.push(Flag::value("udp_interval", value(combination, Tag::Interval)));
                flags.push(Flag::value("udp_count", value(combination, Tag::Count)));
                flags.push(Flag::value("socket_factory", &self.socket_factory));
            }
        }
        if let Some(routing) = &self.routing {
            flags.push(Flag::bare(routing));
        }
        flags
    }
}

/// Combinations are only ever produced from the axes of the same
/// config, which contain every tag asked for here.
pub(crate) fn value(combination: &ParameterCombination, tag: Tag) -> u64 {
    combination
        .get(tag.name())
        .expect("combination from the axes of the same config")
}
