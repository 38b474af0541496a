#![cfg(unix)]

use std::{
    os::unix::fs::PermissionsExt,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use netsweep::{
    reshape::Distances,
    result_store::ResultCollection,
    simulator::{ExternalSimulator, Flag, InvocationError, Simulator, SimulatorCommandLine},
    sweep::{
        config::{SweepConfig, SweepKind},
        runner::SweepRunner,
    },
};

mod common;
use common::TestDir;

/// Writing an executable while another thread forks can make exec
/// fail with ETXTBSY; tests in this file hold this while they write
/// or run scripts.
static PROCESSES: Mutex<()> = Mutex::new(());

fn processes() -> MutexGuard<'static, ()> {
    PROCESSES.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_script(dir: &TestDir, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path.to_string_lossy().into_owned()
}

/// Prints a result whose byte count is the distance times 1000, and
/// nothing at all for distance 6.
const FAKE_SIMULATOR: &str = r#"
for arg in "$@"; do
    case "$arg" in
        --distance=*) distance="${arg#--distance=}" ;;
    esac
done
echo "called with $*" >&2
if [ "$distance" = 6 ]; then bytes=0; else bytes=$((distance * 1000)); fi
echo "{\"rx_bytes_application\": $bytes, \"rx_ms_last\": 11260,"
echo " \"rx_count_packets\": 3, \"tx_count_packets\": 4}"
"#;

fn simulate(program: &str) -> Result<(), InvocationError> {
    let command_line = SimulatorCommandLine::new(program, &[Flag::value("distance", 3)]);
    ExternalSimulator.simulate(&command_line).map(|_| ())
}

#[test]
fn t_observation_from_process() {
    let _processes = processes();
    let dir = TestDir::new("observation");
    let program = write_script(&dir, "sim", FAKE_SIMULATOR);
    let command_line = SimulatorCommandLine::new(
        &program,
        &[Flag::value("height", 1), Flag::value("distance", 12), Flag::bare("olsr")],
    );
    let raw = ExternalSimulator.simulate(&command_line).unwrap();
    assert_eq!(raw.get_u64("rx_bytes_application").unwrap(), 12000);
    assert_eq!(raw.get_u64("tx_count_packets").unwrap(), 4);
}

#[test]
fn t_invocation_failures() {
    let _processes = processes();
    let dir = TestDir::new("failures");

    assert!(matches!(
        simulate(&dir.join("missing").to_string_lossy()),
        Err(InvocationError::Spawn { .. })
    ));

    let program = write_script(&dir, "not-json", "echo hello");
    assert!(matches!(
        simulate(&program),
        Err(InvocationError::Output { .. })
    ));

    let program = write_script(&dir, "two-values", "echo '{}'; echo '{}'");
    assert!(matches!(
        simulate(&program),
        Err(InvocationError::Output { .. })
    ));

    let program = write_script(&dir, "array", "echo '[1]'");
    assert!(matches!(
        simulate(&program),
        Err(InvocationError::NotAnObject(_))
    ));

    let program = write_script(&dir, "fails", "echo oops >&2; exit 3");
    match simulate(&program) {
        Err(InvocationError::ExitStatus { status, outputs, .. }) => {
            assert_eq!(status.code(), Some(3));
            assert!(outputs.contains("oops"), "{outputs:?}");
        }
        other => panic!("expected exit status error, got {other:?}"),
    }
}

#[test]
fn t_loss_sweep_to_file() {
    let _processes = processes();
    let dir = TestDir::new("loss-sweep");
    let mut config = SweepConfig::preset(SweepKind::Loss, true, Some("olsr".into()));
    config.simulator = write_script(&dir, "sim", FAKE_SIMULATOR);
    config.distances = Distances::from(vec![3, 6, 12]);
    config.output = dir.join("udp_comparison.json");

    let collection = SweepRunner::new(&config, ExternalSimulator).run().unwrap();
    assert_eq!(collection.len(), 2);

    let groups = ResultCollection::load_by_distance(Path::new(&config.output)).unwrap();
    assert_eq!(groups.keys().copied().collect::<Vec<_>>(), [3, 6, 12]);
    assert!(groups[&6].is_empty());
    let record = &groups[&3][0];
    assert_eq!(record.throughput, 3.0);
    assert_eq!(record.arrived, Some(75.0));
    assert_eq!(record.command_line.last().map(String::as_str), Some("--olsr"));
    assert_eq!(ResultCollection::ByDistance(groups), collection);
}

#[test]
fn t_failing_sweep_writes_nothing() {
    let _processes = processes();
    let dir = TestDir::new("failing-sweep");
    let mut config = SweepConfig::preset(SweepKind::Throughput, true, None);
    config.simulator = write_script(&dir, "sim", "exit 1");
    config.output = dir.join("tcp_comparison.json");
    assert!(SweepRunner::new(&config, ExternalSimulator).run().is_err());
    assert!(!config.output.exists());
}
