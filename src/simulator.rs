//! Invoking the external network simulator: one synchronous process
//! run per parameter combination, whose standard output must be a
//! single JSON object.

use std::{
    fmt::Display,
    process::{Command, Stdio},
};

use kstring::KString;
use serde_json::{Map, Value};

use crate::{
    debug, info,
    io_utils::bash::bash_string_from_cmd,
    utillib::exit_status_ext::ExitStatusExt,
};

pub const RX_BYTES_APPLICATION: &str = "rx_bytes_application";
pub const RX_MS_LAST: &str = "rx_ms_last";
pub const RX_COUNT_PACKETS: &str = "rx_count_packets";
pub const TX_COUNT_PACKETS: &str = "tx_count_packets";

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("could not start simulator {program:?}: {error}")]
    Spawn {
        program: String,
        error: std::io::Error,
    },
    #[error("simulator `{command_line}` exited with {status}, output:\n{outputs}")]
    ExitStatus {
        command_line: String,
        status: std::process::ExitStatus,
        outputs: String,
    },
    #[error("simulator `{command_line}` did not print a single JSON value: {error}")]
    Output {
        command_line: String,
        error: serde_json::Error,
    },
    #[error("simulator output is not a JSON object but: {0}")]
    NotAnObject(Value),
    #[error("simulator output is missing the field {0:?}")]
    MissingField(&'static str),
    #[error("simulator output field {field:?} is not an unsigned integer: {value}")]
    FieldType { field: &'static str, value: Value },
}

/// The parsed JSON object printed by one simulator run: metric name
/// to (numeric) value. Kept as is, to be persisted alongside the
/// derived metrics.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RawObservation(pub Map<String, Value>);

impl RawObservation {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Parse from a `Value` that must be an object
    pub fn from_value(value: Value) -> Result<Self, InvocationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(InvocationError::NotAnObject(value)),
        }
    }

    pub fn get_u64(&self, field: &'static str) -> Result<u64, InvocationError> {
        let value = self
            .0
            .get(field)
            .ok_or(InvocationError::MissingField(field))?;
        value.as_u64().ok_or_else(|| InvocationError::FieldType {
            field,
            value: value.clone(),
        })
    }
}

impl<const N: usize> From<[(&str, u64); N]> for RawObservation {
    fn from(fields: [(&str, u64); N]) -> Self {
        Self(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_owned(), Value::from(v)))
                .collect(),
        )
    }
}

/// One command line flag for the simulator
#[derive(Debug, Clone, PartialEq)]
pub enum Flag {
    /// `--name=value`
    Value { name: KString, value: String },
    /// `--name`
    Bare(KString),
}

impl Flag {
    pub fn value(name: impl AsRef<str>, value: impl Display) -> Self {
        Flag::Value {
            name: KString::from_ref(name.as_ref()),
            value: value.to_string(),
        }
    }

    /// `name` may be borrowed from anywhere, e.g. a routing mode
    /// from the sweep config.
    pub fn bare(name: impl AsRef<str>) -> Self {
        Flag::Bare(KString::from_ref(name.as_ref()))
    }
}

impl Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flag::Value { name, value } => write!(f, "--{name}={value}"),
            Flag::Bare(name) => write!(f, "--{name}"),
        }
    }
}

/// Program and arguments of one simulator run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorCommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl SimulatorCommandLine {
    pub fn new(program: impl Into<String>, flags: &[Flag]) -> Self {
        Self {
            program: program.into(),
            args: flags.iter().map(|flag| flag.to_string()).collect(),
        }
    }

    /// Program followed by the arguments, the form in which it is
    /// persisted with each record
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = Vec::with_capacity(self.args.len() + 1);
        v.push(self.program.clone());
        v.extend(self.args.iter().cloned());
        v
    }

    pub fn to_bash_string(&self) -> String {
        bash_string_from_cmd(std::iter::once(&self.program).chain(&self.args))
    }
}

/// The seam between the sweep runner and the actual simulator
/// process, so that sweeps can be driven by something else in tests.
pub trait Simulator {
    fn simulate(
        &mut self,
        command_line: &SimulatorCommandLine,
    ) -> Result<RawObservation, InvocationError>;
}

/// Runs the command line as an external process and waits for it.
/// No timeout: a hanging simulator blocks the sweep.
#[derive(Debug, Default)]
pub struct ExternalSimulator;

impl Simulator for ExternalSimulator {
    fn simulate(
        &mut self,
        command_line: &SimulatorCommandLine,
    ) -> Result<RawObservation, InvocationError> {
        let cmd_string = command_line.to_bash_string();
        info!("run simulation: {cmd_string}");

        let output = Command::new(&command_line.program)
            .args(&command_line.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| InvocationError::Spawn {
                program: command_line.program.clone(),
                error,
            })?;

        if !output.status.success() {
            let (status, outputs) = output.status_and_outputs();
            return Err(InvocationError::ExitStatus {
                command_line: cmd_string,
                status,
                outputs,
            });
        }
        if !output.stderr.is_empty() {
            debug!(
                "simulator stderr:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let value: Value =
            serde_json::from_slice(&output.stdout).map_err(|error| InvocationError::Output {
                command_line: cmd_string,
                error,
            })?;
        let observation = RawObservation::from_value(value)?;
        info!(
            "result was {}",
            serde_json::to_string_pretty(&observation).expect("map of JSON values always serializes")
        );
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_flags() {
        let cl = SimulatorCommandLine::new(
            "./simulation3",
            &[
                Flag::value("height", 100),
                Flag::value("socket_factory", "ns3::UdpSocketFactory"),
                Flag::bare("olsr"),
            ],
        );
        assert_eq!(
            cl.to_vec(),
            [
                "./simulation3",
                "--height=100",
                "--socket_factory=ns3::UdpSocketFactory",
                "--olsr"
            ]
        );
        assert_eq!(
            cl.to_bash_string(),
            "./simulation3 --height=100 --socket_factory=ns3::UdpSocketFactory --olsr"
        );
    }

    #[test]
    fn t_get_u64() {
        let obs = RawObservation::from_json_str(
            r#"{"rx_bytes_application": 2000000, "rx_ms_last": 11260, "weird": -1}"#,
        )
        .unwrap();
        assert_eq!(obs.get_u64(RX_BYTES_APPLICATION).unwrap(), 2_000_000);
        assert_eq!(obs.get_u64(RX_MS_LAST).unwrap(), 11260);
        assert!(matches!(
            obs.get_u64(RX_COUNT_PACKETS),
            Err(InvocationError::MissingField(RX_COUNT_PACKETS))
        ));
        assert!(matches!(
            obs.get_u64("weird"),
            Err(InvocationError::FieldType { .. })
        ));
    }

    #[test]
    fn t_not_an_object() {
        assert!(matches!(
            RawObservation::from_value(serde_json::json!([1, 2])),
            Err(InvocationError::NotAnObject(_))
        ));
    }
}
