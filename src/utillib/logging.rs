//! Leveled logging to stderr, kept out of the rendered figures.
//!
//! Each line is prefixed with the local time and the source location
//! of the `warn!`/`info!`/`debug!` call.

use std::{
    io::{stderr, StderrLock, Write},
    sync::atomic::{AtomicU8, Ordering},
};

use anyhow::{bail, Result};
use chrono::{Local, SecondsFormat};

/// Locks stderr and writes the prefix of one log line.
#[doc(hidden)]
pub fn start_line(file: &str, line: u32) -> StderrLock<'static> {
    let now = Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    let mut lock = stderr().lock();
    // Logging has nowhere to report its own failure
    let _ = write!(&mut lock, "{now}\t{file}:{line}\t");
    lock
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    { $level:ident, $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::$level {
            use std::io::Write;
            let mut lock = $crate::utillib::logging::start_line(file!(), line!());
            let _ = writeln!(&mut lock, $($arg)*);
        }
    }
}

/// Malformed input and other things a user should see by default.
#[macro_export]
macro_rules! warn {
    { $($arg:tt)* } => { $crate::log_at!(Warn, $($arg)*) }
}

/// What is being read and written.
#[macro_export]
macro_rules! info {
    { $($arg:tt)* } => { $crate::log_at!(Info, $($arg)*) }
}

/// Expected absences, skipped styles and the like.
#[macro_export]
macro_rules! debug {
    { $($arg:tt)* } => { $crate::log_at!(Debug, $($arg)*) }
}

/// Verbosity flags shared by the binaries; converted into a
/// `LogLevel` via `TryFrom`, which rejects contradicting flags.
#[derive(Debug, clap::Args)]
pub struct LogLevelOpt {
    /// Show what is being read and rendered, including per-series
    /// skip counts
    #[clap(short, long)]
    verbose: bool,

    /// Show information that helps debug this program, e.g. every
    /// trial file that is absent (implies `--verbose`)
    #[clap(short, long)]
    debug: bool,

    /// Disable warnings about malformed input files. Conflicts with
    /// `--verbose` and `--debug`.
    #[clap(short, long)]
    quiet: bool,
}

impl TryFrom<LogLevelOpt> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(opt: LogLevelOpt) -> Result<Self> {
        let LogLevelOpt {
            verbose,
            debug,
            quiet,
        } = opt;
        Ok(match (verbose, debug, quiet) {
            (false, false, false) => LogLevel::Warn,
            (true, false, false) => LogLevel::Info,
            (_, true, false) => LogLevel::Debug,
            (false, false, true) => LogLevel::Quiet,
            (_, _, true) => {
                bail!("option `--quiet` conflicts with the options `--verbose` and `--debug`")
            }
        })
    }
}

/// Ordered by verbosity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Quiet,
    /// The default
    Warn,
    Info,
    Debug,
}

const LEVELS: [LogLevel; 4] = [
    LogLevel::Quiet,
    LogLevel::Warn,
    LogLevel::Info,
    LogLevel::Debug,
];

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

#[inline]
pub fn log_level() -> LogLevel {
    // Only `set_log_level` stores, so the index is always valid
    LEVELS[usize::from(LOG_LEVEL.load(Ordering::Relaxed))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_level_table() {
        for (i, level) in LEVELS.iter().enumerate() {
            assert_eq!(*level as usize, i);
        }
        assert!(LogLevel::Quiet < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn t_flags() -> Result<()> {
        let opt = |verbose, debug, quiet| LogLevelOpt {
            verbose,
            debug,
            quiet,
        };
        assert_eq!(LogLevel::try_from(opt(false, false, false))?, LogLevel::Warn);
        assert_eq!(LogLevel::try_from(opt(true, false, false))?, LogLevel::Info);
        assert_eq!(LogLevel::try_from(opt(true, true, false))?, LogLevel::Debug);
        assert_eq!(LogLevel::try_from(opt(false, false, true))?, LogLevel::Quiet);
        assert!(LogLevel::try_from(opt(true, false, true)).is_err());
        Ok(())
    }
}
