use std::{
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use clap::Parser;

use netsweep::{
    align::Comparison,
    chart::Chart,
    config_file::{load_config_file, save_config_file},
    ctx,
    curve::{arrival_throughput_chart, arrival_throughput_curve},
    get_terminal_width::get_terminal_width,
    index_map::{height_size_label, interval_count_label, IndexMap},
    info,
    record::{Metric, Tag},
    reshape::{Distances, RecordFilter, Reshape},
    result_store::ResultCollection,
    simulator::ExternalSimulator,
    sweep::{
        config::{SweepConfig, SweepKind, DEFAULT_ROUTING},
        runner::SweepRunner,
    },
    utillib::logging::{set_log_level, LogLevel, LogLevelOpt},
    NETSWEEP_VERSION,
};

const PROGRAM_NAME: &str = "netsweep";

#[derive(clap::Parser, Debug)]
#[command(next_line_help = true, term_width = get_terminal_width(4))]
/// Run network simulations over parameter grids, and reshape the
/// results into per-distance series for plotting.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    #[clap(flatten)]
    output: OutputOpts,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(clap::Args, Debug)]
struct OutputOpts {
    /// Print series as JSON, for plotting, instead of a table
    #[clap(long, global = true)]
    json: bool,

    /// Print tables as tab separated values, without padding or
    /// highlighting
    #[clap(long, global = true)]
    tsv: bool,
}

#[derive(clap::Args, Debug)]
struct SweepOpts {
    /// Load the sweep settings from this file instead of using the
    /// built-in preset (run `config-formats` for the supported
    /// formats). The routing argument still overrides the file.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Override the path to the simulator binary
    #[clap(long)]
    simulator: Option<String>,

    /// Override the path of the result file
    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print version
    Version,

    /// Show the supported config file formats
    ConfigFormats,

    /// Save a built-in sweep preset as a config file (format
    /// determined by the file extension), as a starting point for
    /// `--config`
    WriteConfig {
        /// `throughput` or `loss`
        #[clap(long)]
        kind: SweepKindOpt,

        /// The single-setting comparison preset instead of the full
        /// sweep
        #[clap(long)]
        comparison: bool,

        /// Routing mode flag to pass to the simulator
        #[clap(long)]
        routing: Option<String>,

        output_path: PathBuf,
    },

    /// Run the throughput (TCP) sweep. Without ROUTING, the full sweep
    /// using OLSR routing; with ROUTING, the comparison setting
    /// (h=100m, 20MB) using that routing mode.
    Tcp {
        #[clap(flatten)]
        sweep_opts: SweepOpts,

        routing: Option<String>,
    },

    /// Run the UDP packet loss sweep, with the same ROUTING convention
    /// as `tcp`
    UdpLoss {
        #[clap(flatten)]
        sweep_opts: SweepOpts,

        routing: Option<String>,
    },

    /// Throughput by distance for each height and payload size, from
    /// the results of a full `tcp` sweep
    TcpMatrix {
        #[clap(default_value = "tcp_tests.json")]
        file: PathBuf,
    },

    /// Arrival percentage or throughput by distance for each packet
    /// interval and count, at one height, from the results of a full
    /// `udp-loss` sweep
    UdpMatrix {
        /// `arrived` or `throughput`
        #[clap(long)]
        metric: Metric,

        /// Only use runs at this antenna height (m)
        #[clap(long)]
        height: u64,

        /// The value for distances without a result (default: 100
        /// for `arrived`, 0 for `throughput`)
        #[clap(long)]
        sentinel: Option<f64>,

        #[clap(default_value = "udp_loss.json")]
        file: PathBuf,
    },

    /// Throughput as a function of the packet arrival percentage,
    /// from the results of a `udp-loss` sweep
    LossThroughput {
        #[clap(default_value = "udp_loss.json")]
        file: PathBuf,
    },

    /// Compare TCP and UDP throughput: one panel per pair of `--tcp`
    /// and `--udp` files, each also showing the `--baseline`
    Compare {
        /// Throughput sweep result files, one per panel
        #[clap(long, default_value = "tcp_tests.json")]
        tcp: Vec<PathBuf>,

        /// Loss sweep result files, one per panel
        #[clap(long, default_value = "udp_comparison_speed.json")]
        udp: Vec<PathBuf>,

        /// Loss sweep result file shown in every panel
        #[clap(long, default_value = "udp_comparison_speed.json")]
        baseline: PathBuf,

        /// Panel titles, one per panel
        #[clap(
            long,
            default_value = "Comparison of TCP and UDP throughput (h=100m, s=20MB)"
        )]
        title: Vec<String>,
    },

    /// `compare` with the static 1-hop and 3-hop route result files
    Routes {
        /// Loss sweep result file shown in every panel
        #[clap(long, default_value = "udp_comparison_speed.json")]
        baseline: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SweepKindOpt {
    Throughput,
    Loss,
}

impl From<SweepKindOpt> for SweepKind {
    fn from(value: SweepKindOpt) -> Self {
        match value {
            SweepKindOpt::Throughput => SweepKind::Throughput,
            SweepKindOpt::Loss => SweepKind::Loss,
        }
    }
}

/// The preset, or the config file; then the command line overrides.
fn sweep_config(
    kind: SweepKind,
    sweep_opts: SweepOpts,
    routing: Option<String>,
) -> Result<SweepConfig> {
    let SweepOpts {
        config,
        simulator,
        output,
    } = sweep_opts;
    let mut sweep_config = if let Some(path) = &config {
        let sweep_config: SweepConfig = load_config_file(path)?;
        if sweep_config.kind != kind {
            bail!(
                "config file {path:?} is for a {:?} sweep, not {kind:?}",
                sweep_config.kind
            )
        }
        if routing.is_some() {
            SweepConfig {
                routing,
                ..sweep_config
            }
        } else {
            sweep_config
        }
    } else {
        match routing {
            Some(routing) => SweepConfig::preset(kind, true, Some(routing)),
            None => SweepConfig::preset(kind, false, Some(DEFAULT_ROUTING.into())),
        }
    };
    if let Some(simulator) = simulator {
        sweep_config.simulator = simulator;
    }
    if let Some(output) = output {
        sweep_config.output = output;
    }
    Ok(sweep_config)
}

fn run_sweep(sweep_config: &SweepConfig) -> Result<()> {
    let axes = sweep_config.axes()?;
    info!(
        "running {} simulations, writing to {:?}",
        axes.total(),
        sweep_config.output
    );
    SweepRunner::new(sweep_config, ExternalSimulator).run()?;
    Ok(())
}

fn load(path: &Path) -> Result<ResultCollection> {
    Ok(ResultCollection::load(path)?)
}

fn emit(charts: &[Chart], output: &OutputOpts) -> Result<()> {
    let mut out = stdout().lock();
    if output.json {
        let s = if let [chart] = charts {
            serde_json::to_string_pretty(chart)
        } else {
            serde_json::to_string_pretty(charts)
        }?;
        writeln!(out, "{s}")?;
    } else {
        for (i, chart) in charts.iter().enumerate() {
            if i > 0 && !output.tsv {
                writeln!(out)?;
            }
            chart.write_table(output.tsv, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn compare(
    tcp: &[PathBuf],
    udp: &[PathBuf],
    baseline: &Path,
    titles: &[String],
) -> Result<Vec<Chart>> {
    let tcp = tcp.iter().map(|p| load(p)).collect::<Result<Vec<_>>>()?;
    let udp = udp.iter().map(|p| load(p)).collect::<Result<Vec<_>>>()?;
    let baseline = load(baseline)?;
    let comparison = Comparison {
        tcp: &tcp,
        udp: &udp,
        baseline: &baseline,
        titles,
    };
    Ok(comparison.panels(&Distances::default())?)
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        output,
        subcommand,
    } = Opts::parse();

    // sweeps take long, show their progress unless `--quiet`
    let default_log_level = match subcommand {
        SubCommand::Tcp { .. } | SubCommand::UdpLoss { .. } => LogLevel::Info,
        _ => LogLevel::Warn,
    };
    set_log_level(log_level.log_level_defaulting_to(default_log_level)?);

    match subcommand {
        SubCommand::Version => println!("{PROGRAM_NAME} version {NETSWEEP_VERSION}"),

        SubCommand::ConfigFormats => {
            for (extension, backend) in netsweep::config_file::FILE_EXTENSIONS {
                println!("  .{extension}\t{backend:?}");
            }
        }

        SubCommand::WriteConfig {
            kind,
            comparison,
            routing,
            output_path,
        } => {
            let config = SweepConfig::preset(kind.into(), comparison, routing);
            save_config_file(&output_path, &config)
                .map_err(ctx!("writing config to {output_path:?}"))?;
        }

        SubCommand::Tcp {
            sweep_opts,
            routing,
        } => run_sweep(&sweep_config(SweepKind::Throughput, sweep_opts, routing)?)?,

        SubCommand::UdpLoss {
            sweep_opts,
            routing,
        } => run_sweep(&sweep_config(SweepKind::Loss, sweep_opts, routing)?)?,

        SubCommand::TcpMatrix { file } => {
            let collection = load(&file)?;
            let index_map =
                IndexMap::product(Tag::Height, &[1, 100], Tag::Size, &[10000, 1000000, 20000000])?;
            let matrix = Reshape {
                distances: &Distances::default(),
                index_map: &index_map,
                metric: Metric::Throughput,
                sentinel: 0.,
                filter: None,
            }
            .run(&collection)
            .map_err(ctx!("reshaping {file:?}"))?;
            let chart = Chart::from_matrix(
                "TCP Throughput",
                "Throughput (kB/s)",
                matrix,
                index_map.labels(height_size_label),
            );
            emit(&[chart], &output)?;
        }

        SubCommand::UdpMatrix {
            metric,
            height,
            sentinel,
            file,
        } => {
            let collection = load(&file)?;
            let index_map =
                IndexMap::product(Tag::Interval, &[10, 100], Tag::Count, &[10, 100, 1000])?;
            let (default_sentinel, title, y_label) = match metric {
                Metric::Arrived => (
                    100.,
                    "UDP Packet Loss".to_string(),
                    "Packets arrived at receiver (%)",
                ),
                Metric::Throughput => (
                    0.,
                    format!("UDP Throughput using different sending patterns (h={height}m)"),
                    "Throughput (kB/s)",
                ),
            };
            let matrix = Reshape {
                distances: &Distances::default(),
                index_map: &index_map,
                metric,
                sentinel: sentinel.unwrap_or(default_sentinel),
                filter: Some(RecordFilter {
                    tag: Tag::Height,
                    value: height,
                }),
            }
            .run(&collection)
            .map_err(ctx!("reshaping {file:?}"))?;
            let labels = index_map.labels(interval_count_label);
            emit(&[Chart::from_matrix(title, y_label, matrix, labels)], &output)?;
        }

        SubCommand::LossThroughput { file } => {
            let points = arrival_throughput_curve(&load(&file)?)
                .map_err(ctx!("collecting points from {file:?}"))?;
            emit(&[arrival_throughput_chart(points)], &output)?;
        }

        SubCommand::Compare {
            tcp,
            udp,
            baseline,
            title,
        } => {
            let charts = compare(&tcp, &udp, &baseline, &title)?;
            emit(&charts, &output)?;
        }

        SubCommand::Routes { baseline } => {
            let charts = compare(
                &["tcp_comparison_1hop.json".into(), "tcp_comparison_3hop.json".into()],
                &["udp_comparison_1hop.json".into(), "udp_comparison_3hop.json".into()],
                &baseline,
                &[
                    "Throughput comparison using static 1-hop route (h=100m, s=20MB)".into(),
                    "Throughput comparison using static 3-hop route (h=100m, s=20MB)".into(),
                ],
            )?;
            emit(&charts, &output)?;
        }
    }

    Ok(())
}
