// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! The aif-logger
//!
//! Console logger for AIF applications. Every line carries a wall clock timestamp,
//! the log target, process and thread id and the level.

use log::{LevelFilter, Log, Metadata, SetLoggerError};
use std::io::{self, Write};
use std::process;
use std::str::FromStr;
use std::time::SystemTime;

pub mod fmt;
pub mod record;

const ENV_RUST_LOG: &str = "RUST_LOG";
const MAX_ARGS_SIZE: usize = 8 * 1024;

/// Initialize the logger.
///
/// A valid level passed as `RUST_LOG` environment variable overrides `level`.
/// Enable output to `stdout` via `console`.
pub fn init(level: LevelFilter, console: bool) {
    try_init(level, console).expect("failed to set logger")
}

/// Like [init], but fails if a logger is already installed
pub fn try_init(level: LevelFilter, console: bool) -> Result<(), SetLoggerError> {
    let logger = Logger::new(console);

    // Set the logger in the global subsystem.
    log::set_boxed_logger(Box::new(logger))?;
    // Set the maximum log level the log subsystem will forward to this logger impl.
    log::set_max_level(level_from_env().unwrap_or(level));
    Ok(())
}

/// The AIF logger.
#[derive(Debug)]
pub struct Logger {
    console: bool,
}

impl Logger {
    /// Create a new logger.
    pub fn new(console: bool) -> Self {
        Self { console }
    }
}

impl Log for Logger {
    /// Check if a log message with the specified metadata would be logged.
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = SystemTime::now();
        let tgid = process::id();
        let tid = record::thread_id();
        // Format args into a stack buffer. Messages exceeding the buffer are truncated.
        let args_buffer = &mut [0u8; MAX_ARGS_SIZE];
        let args = {
            let mut writer = io::Cursor::new(&mut args_buffer[..]);
            let _ = write!(&mut writer, "{}", record.args());
            let len = writer.position() as usize;
            record::utf8_prefix(&args_buffer[0..len])
        };

        let record = record::Record::new(
            timestamp,
            record.level(),
            record.target(),
            record.file(),
            record.line(),
            tgid,
            tid,
            args,
        );

        let _ = fmt::format(&record, io::stdout().lock());
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Try to parse the log level from the environment variable `RUST_LOG`.
fn level_from_env() -> Option<LevelFilter> {
    std::env::var(ENV_RUST_LOG).ok().and_then(|s| {
        LevelFilter::from_str(&s)
            .inspect_err(|_| eprintln!("Failed to parse log level from `RUST_LOG={s}`"))
            .ok()
    })
}
