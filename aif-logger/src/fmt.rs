// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use crate::record::Record;
use console::{style, Color, StyledObject};
use log::Level;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:3]");

static TARGET_SIZE: AtomicUsize = AtomicUsize::new(16);
static TGID_SIZE: AtomicUsize = AtomicUsize::new(4);
static TID_SIZE: AtomicUsize = AtomicUsize::new(4);

/// Write `record` as one line to `writer`.
///
/// Colors are applied only if the console crate detects a color capable terminal.
pub fn format<W: io::Write>(record: &Record, mut writer: W) -> io::Result<()> {
    let timestamp = OffsetDateTime::from(record.timestamp)
        .format(TIMESTAMP_FORMAT)
        .map_err(io::Error::other)?;

    let level = {
        let level_color = match record.level {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Green,
            Level::Debug => Color::Color256(243),
            Level::Trace => Color::White,
        };
        style(record.level).bold().fg(level_color)
    };

    let tgid = format_id(record.tgid, &TGID_SIZE, true);
    let tid = format_id(record.tid, &TID_SIZE, false);
    let message = record.args;

    let target = {
        let target = record.target;
        TARGET_SIZE.fetch_max(target.len(), Ordering::Relaxed);
        let target_size = TARGET_SIZE.load(Ordering::Relaxed);
        style(format!("{target:<target_size$}")).fg(target.color())
    };

    // Location only on trace level
    if record.level == Level::Trace {
        let file = record.file.unwrap_or("file unknown");
        let file = style(file).fg(file.color());
        let line = record.line.unwrap_or(0);
        writeln!(
            writer,
            "{timestamp} {target} ({tgid} {tid}): {level:<5}: {file}:{line}: {message}",
        )
    } else {
        writeln!(
            writer,
            "{timestamp} {target} ({tgid} {tid}): {level:<5}: {message}"
        )
    }
}

/// Generate a color of `self`.
trait HashColor {
    fn color(&self) -> Color;
}

impl HashColor for &str {
    fn color(&self) -> Color {
        let hash = self.bytes().fold(42u8, |c, x| c ^ x);
        Color::Color256(hash)
    }
}

impl HashColor for u32 {
    fn color(&self) -> Color {
        // Skip colors that are hard to read on dark terminals
        let color = match *self as u8 {
            c @ 0..=1 => c + 2,
            c @ 16..=21 => c + 6,
            c @ 52..=55 | c @ 126..=129 => c + 4,
            c @ 163..=165 | c @ 200..=201 => c + 3,
            c @ 207 => c + 1,
            c @ 232..=240 => c + 9,
            c => c,
        };
        Color::Color256(color)
    }
}

/// Format `id` with a color based on `id`. Update `width` with the
/// maximum length of the formatted `id`.
fn format_id(id: u32, width: &AtomicUsize, align_left: bool) -> StyledObject<String> {
    width.fetch_max(num_hex_digits(id), Ordering::Relaxed);
    let len = width.load(Ordering::Relaxed);
    let color = id.color();
    if align_left {
        style(format!("{id:<len$x}")).fg(color)
    } else {
        style(format!("{id:>len$x}")).fg(color)
    }
}

// Calculate the number of hex digits needed to represent `n`.
fn num_hex_digits(n: u32) -> usize {
    (1 + n.checked_ilog2().unwrap_or_default() / 4) as usize
}
