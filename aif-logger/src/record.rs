// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use log::Level;
use std::str;
use std::time::SystemTime;

/// A log record ready for formatting
#[derive(Debug)]
pub struct Record<'a> {
    pub timestamp: SystemTime,
    pub level: Level,
    pub target: &'a str,
    pub file: Option<&'a str>,
    pub line: Option<u32>,
    pub tgid: u32,
    pub tid: u32,
    pub args: &'a str,
}

impl Record<'_> {
    /// Create a new record.
    #[allow(clippy::too_many_arguments)]
    pub fn new<'a>(
        timestamp: SystemTime,
        level: Level,
        target: &'a str,
        file: Option<&'a str>,
        line: Option<u32>,
        tgid: u32,
        tid: u32,
        args: &'a str,
    ) -> Record<'a> {
        Record {
            timestamp,
            level,
            target,
            file,
            line,
            tgid,
            tid,
            args,
        }
    }
}

/// Get the current thread id
pub fn thread_id() -> u32 {
    // Safety: gettid(2) says this never fails
    unsafe { libc::gettid() as u32 }
}

/// The longest valid UTF-8 prefix of `bytes`. Cuts a character split by truncation.
pub fn utf8_prefix(bytes: &[u8]) -> &str {
    match str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}
