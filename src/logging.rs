//! Console and file logging
//!
//! Every record goes to stderr and is appended to the log file, formatted
//! as `[YYYY-MM-DD HH:MM:SS] [LEVEL] message`.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Writes everything to two sinks.
///
/// Both sinks see every write even when one fails; the first error is
/// returned.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let first = self.first.write_all(buf);
        let second = self.second.write_all(buf);
        first.and(second).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let first = self.first.flush();
        let second = self.second.flush();
        first.and(second)
    }
}

/// Render one log line, without the trailing newline
pub fn render_line(timestamp: NaiveDateTime, level: log::Level, message: impl Display) -> String {
    format!(
        "[{}] [{}] {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

/// Pick the log level from the verbosity flags
pub fn level_filter(verbose: u8, quiet: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Error;
    }
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Install the global logger, appending to `log_file`.
///
/// Records from this crate and the `dashboard` client use `level`; other
/// crates only report warnings.
pub fn init(level: log::LevelFilter, log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Could not open log file {}", log_file.display()))?;

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("sm_autotag", level)
        .filter_module("dashboard", level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                render_line(
                    chrono::Local::now().naive_local(),
                    record.level(),
                    record.args()
                )
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee::new(io::stderr(), file))))
        .try_init()
        .context("Logger already initialized")?;

    Ok(())
}
