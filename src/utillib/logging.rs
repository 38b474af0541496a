//! Leveled logging to stderr, for operator visibility while a sweep
//! is running. Progress and results go through `info!`; commands that
//! run sweeps default to showing them, the others only show `warn!`
//! unless `--verbose` is given.

use std::{
    io::{stderr, StderrLock, Write},
    sync::atomic::{AtomicU8, Ordering},
};

use anyhow::{bail, Result};
use chrono::{Local, SecondsFormat};

pub fn write_time(file: &str, line: u32, column: u32) -> StderrLock<'static> {
    let t_str = Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    let mut lock = stderr().lock();
    write!(&mut lock, "{t_str}\t{file}:{line}:{column}\t").expect("stderr must not fail");
    lock
}

// Do *not* make the fields public here to force going through `TryFrom`, OK?
#[derive(Debug, clap::Args)]
pub struct LogLevelOpt {
    /// Show what is being done (commands issued, parsed simulator
    /// results, progress)
    #[clap(short, long)]
    verbose: bool,

    /// Show information that helps debug this program (implies
    /// `--verbose`)
    #[clap(short, long)]
    debug: bool,

    /// Disable warnings and sweep progress. Conflicts with `--verbose`
    /// and `--debug`.
    #[clap(short, long)]
    quiet: bool,
}

impl LogLevelOpt {
    /// The level to use when none of the options was given is
    /// `default`.
    pub fn log_level_defaulting_to(self, default: LogLevel) -> Result<LogLevel> {
        match self {
            LogLevelOpt {
                verbose: false,
                debug: false,
                quiet: false,
            } => Ok(default),
            LogLevelOpt {
                verbose: true,
                debug: false,
                quiet: false,
            } => Ok(LogLevel::Info.max(default)),
            LogLevelOpt {
                verbose: _,
                debug: true,
                quiet: false,
            } => Ok(LogLevel::Debug),
            LogLevelOpt {
                verbose: false,
                debug: false,
                quiet: true,
            } => Ok(LogLevel::Quiet),
            LogLevelOpt {
                verbose: _,
                debug: _,
                quiet: true,
            } => bail!("option `--quiet` conflicts with the options `--verbose` and `--debug`"),
        }
    }
}

impl TryFrom<LogLevelOpt> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(value: LogLevelOpt) -> Result<Self> {
        value.log_level_defaulting_to(LogLevel::Warn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Do not log anything
    Quiet,
    /// The default, only `warn!` statements output anything
    Warn,
    /// Verbose execution, not for debugging this program but for
    /// giving the operator information about the running sweep
    Info,
    /// Highest amount of log statements, for debugging this program
    Debug,
}

impl LogLevel {
    fn level(self) -> u8 {
        self as u8
    }

    fn from_level(level: u8) -> Option<Self> {
        let slf = match level {
            0 => Some(LogLevel::Quiet),
            1 => Some(LogLevel::Warn),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Debug),
            _ => None,
        }?;
        assert_eq!(slf.level(), level);
        Some(slf)
    }
}

pub static LOGLEVEL: AtomicU8 = AtomicU8::new(1);

pub fn set_log_level(val: LogLevel) {
    LOGLEVEL.store(val.level(), Ordering::Relaxed);
}

#[inline]
pub fn log_level() -> LogLevel {
    let level = LOGLEVEL.load(Ordering::Relaxed);
    LogLevel::from_level(level).expect("no possibility to store invalid u8")
}

#[macro_export]
macro_rules! warn {
    { $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::Warn {
            use std::io::Write;
            let mut lock = $crate::utillib::logging::write_time(file!(), line!(), column!());
            writeln!(&mut lock, $($arg)*).expect("stderr must not fail");
        }
    }
}

#[macro_export]
macro_rules! info {
    { $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::Info {
            use std::io::Write;
            let mut lock = $crate::utillib::logging::write_time(file!(), line!(), column!());
            writeln!(&mut lock, $($arg)*).expect("stderr must not fail");
        }
    }
}

#[macro_export]
macro_rules! debug {
    { $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::Debug {
            use std::io::Write;
            let mut lock = $crate::utillib::logging::write_time(file!(), line!(), column!());
            writeln!(&mut lock, $($arg)*).expect("stderr must not fail");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_levels() {
        for i in 0..=3 {
            let level = LogLevel::from_level(i).expect("valid level");
            assert_eq!(level.level(), i);
        }
        assert!(LogLevel::from_level(4).is_none());
        assert!(LogLevel::Debug > LogLevel::Info);
        assert!(LogLevel::Warn > LogLevel::Quiet);
    }

    #[test]
    fn t_quiet_conflicts() {
        let opt = LogLevelOpt {
            verbose: true,
            debug: false,
            quiet: true,
        };
        assert!(LogLevel::try_from(opt).is_err());
        let opt = LogLevelOpt {
            verbose: false,
            debug: true,
            quiet: false,
        };
        assert_eq!(LogLevel::try_from(opt).unwrap(), LogLevel::Debug);
    }

    #[test]
    fn t_sweep_default_shows_progress() {
        let opt = |verbose, debug, quiet| LogLevelOpt {
            verbose,
            debug,
            quiet,
        };
        let sweep = |o: LogLevelOpt| o.log_level_defaulting_to(LogLevel::Info).unwrap();
        assert_eq!(sweep(opt(false, false, false)), LogLevel::Info);
        assert_eq!(sweep(opt(true, false, false)), LogLevel::Info);
        assert_eq!(sweep(opt(false, true, false)), LogLevel::Debug);
        assert_eq!(sweep(opt(false, false, true)), LogLevel::Quiet);
        assert_eq!(
            LogLevel::try_from(opt(false, false, false)).unwrap(),
            LogLevel::Warn
        );
    }
}
