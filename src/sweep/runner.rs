//! Driving the simulator over all combinations of a sweep, strictly
//! sequentially, and collecting the resulting records.

use anyhow::Result;

use crate::{
    ctx, info,
    record::{Tag, TaggedRecord},
    result_store::ResultCollection,
    simulator::{Simulator, SimulatorCommandLine},
    sweep::{
        config::{value, SweepConfig, SweepKind},
        derived::DerivedMetrics,
    },
    warn,
};

pub struct SweepRunner<'c, S: Simulator> {
    config: &'c SweepConfig,
    simulator: S,
}

impl<'c, S: Simulator> SweepRunner<'c, S> {
    pub fn new(config: &'c SweepConfig, simulator: S) -> Self {
        Self { config, simulator }
    }

    /// Run every combination once, in enumeration order. The first
    /// failing simulator run aborts the sweep, dropping what was
    /// collected so far.
    pub fn collect(&mut self) -> Result<ResultCollection> {
        let config = self.config;
        let axes = config.axes()?;
        let packets = config.kind == SweepKind::Loss;
        let mut collection = match config.kind {
            SweepKind::Throughput => ResultCollection::Flat(Vec::new()),
            SweepKind::Loss => ResultCollection::by_distance(config.distances.as_slice()),
        };

        let total = axes.total();
        for (i, combination) in axes.combinations().enumerate() {
            let current = i + 1;
            let command_line =
                SimulatorCommandLine::new(&config.simulator, &config.flags(&combination));
            let raw = self
                .simulator
                .simulate(&command_line)
                .map_err(ctx!("sweep aborted at {combination}"))?;
            info!(
                "=====> {current}/{total} ({:.1}%)",
                current as f64 / total as f64 * 100.
            );

            let metrics =
                match DerivedMetrics::from_observation(&raw, config.start_offset_ms, packets)
                    .map_err(ctx!("sweep aborted at {combination}"))?
                {
                    Some(metrics) => metrics,
                    None => {
                        info!("no data arrived for {combination}, discarding run");
                        continue;
                    }
                };
            if !metrics.is_finite() {
                warn!("non-finite metrics {metrics:?} for {combination}, discarding run");
                continue;
            }
            info!("Throughput: {} kB/s", metrics.throughput);
            if let Some(arrived) = metrics.arrived {
                info!("{arrived}% of packets arrived");
            }

            collection.push(TaggedRecord {
                distance: Some(value(&combination, Tag::Distance)),
                size: combination.get(Tag::Size.name()),
                height: value(&combination, Tag::Height),
                interval: combination.get(Tag::Interval.name()),
                count: combination.get(Tag::Count.name()),
                throughput: metrics.throughput,
                arrived: metrics.arrived,
                command_line: command_line.to_vec(),
                raw_data: raw,
            });
        }
        Ok(collection)
    }

    /// `collect`, then write the whole collection to the configured
    /// output file (once, at the end).
    pub fn run(&mut self) -> Result<ResultCollection> {
        let collection = self.collect()?;
        let output = &self.config.output;
        collection
            .save(output)
            .map_err(ctx!("saving {} records to {output:?}", collection.len()))?;
        info!("wrote {} records to {output:?}", collection.len());
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        reshape::Distances,
        simulator::{
            InvocationError, RawObservation, RX_BYTES_APPLICATION, RX_COUNT_PACKETS, RX_MS_LAST,
            TX_COUNT_PACKETS,
        },
    };

    use super::*;

    /// Answers from a function of the `--distance` argument, and
    /// remembers the command lines it was given.
    struct FakeSimulator<F> {
        answer: F,
        calls: Vec<Vec<String>>,
    }

    impl<F: FnMut(u64) -> Result<RawObservation, InvocationError>> Simulator
        for &mut FakeSimulator<F>
    {
        fn simulate(
            &mut self,
            command_line: &SimulatorCommandLine,
        ) -> Result<RawObservation, InvocationError> {
            self.calls.push(command_line.to_vec());
            let distance = command_line
                .args
                .iter()
                .find_map(|arg| arg.strip_prefix("--distance="))
                .expect("distance flag")
                .parse()
                .expect("integer");
            (self.answer)(distance)
        }
    }

    fn observation(rx_bytes: u64, rx_ms_last: u64) -> RawObservation {
        RawObservation::from([
            (RX_BYTES_APPLICATION, rx_bytes),
            (RX_MS_LAST, rx_ms_last),
            (RX_COUNT_PACKETS, 9),
            (TX_COUNT_PACKETS, 10),
        ])
    }

    fn small_config(kind: SweepKind) -> SweepConfig {
        let mut config = SweepConfig::preset(kind, true, None);
        config.distances = Distances::from(vec![3, 6, 12]);
        config
    }

    #[test]
    fn t_zero_results_are_filtered() {
        let config = small_config(SweepKind::Loss);
        let mut fake = FakeSimulator {
            answer: |distance: u64| {
                Ok(if distance == 6 {
                    observation(0, 0)
                } else {
                    observation(distance * 1000, 11260)
                })
            },
            calls: vec![],
        };
        let collection = SweepRunner::new(&config, &mut fake).collect().unwrap();
        assert_eq!(fake.calls.len(), 3);
        assert_eq!(collection.len(), 2);
        let ResultCollection::ByDistance(groups) = collection else {
            panic!("loss sweeps are grouped")
        };
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), [3, 6, 12]);
        assert!(groups[&6].is_empty());
        let record = &groups[&12][0];
        assert_eq!(record.throughput, 12.0);
        assert_eq!(record.arrived, Some(90.0));
        assert_eq!(record.distance, Some(12));
        assert_eq!((record.interval, record.count), (Some(100), Some(1000)));
        assert_eq!(record.size, None);
        assert_eq!(record.command_line, fake.calls[2]);
    }

    #[test]
    fn t_throughput_records_in_order() {
        let config = small_config(SweepKind::Throughput);
        let mut fake = FakeSimulator {
            answer: |distance: u64| Ok(observation(distance * 1000, 11260)),
            calls: vec![],
        };
        let collection = SweepRunner::new(&config, &mut fake).collect().unwrap();
        let ResultCollection::Flat(records) = collection else {
            panic!("throughput sweeps are flat")
        };
        let cells: Vec<_> = records
            .iter()
            .map(|r| (r.distance, r.size, r.height, r.arrived))
            .collect();
        assert_eq!(
            cells,
            [
                (Some(3), Some(20_000_000), 100, None),
                (Some(6), Some(20_000_000), 100, None),
                (Some(12), Some(20_000_000), 100, None),
            ]
        );
    }

    #[test]
    fn t_failure_aborts() {
        let config = small_config(SweepKind::Throughput);
        let mut fake = FakeSimulator {
            answer: |distance: u64| {
                if distance == 6 {
                    Err(InvocationError::MissingField(RX_MS_LAST))
                } else {
                    Ok(observation(1000, 11260))
                }
            },
            calls: vec![],
        };
        let e = SweepRunner::new(&config, &mut fake).collect().unwrap_err();
        assert_eq!(fake.calls.len(), 2, "no run after the failing one");
        assert!(matches!(
            e.downcast_ref::<InvocationError>(),
            Some(InvocationError::MissingField(_))
        ));
    }

    #[test]
    fn t_non_finite_skipped() {
        let config = small_config(SweepKind::Throughput);
        let mut fake = FakeSimulator {
            answer: |distance: u64| Ok(observation(1000, if distance == 3 { 10260 } else { 11260 })),
            calls: vec![],
        };
        let collection = SweepRunner::new(&config, &mut fake).collect().unwrap();
        assert_eq!(collection.len(), 2);
    }
}
