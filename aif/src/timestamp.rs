// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Monotonic millisecond clock used to stamp messages

use std::fmt::Display;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static STARTUP_INSTANT: OnceLock<Instant> = OnceLock::new();

/// Anchor the clock. Calling this is optional, the first call to [`now`] does it as well.
pub fn initialize() {
    let _ = startup_instant();
}

/// Return the instant the clock was anchored at
pub fn startup_instant() -> Instant {
    *STARTUP_INSTANT.get_or_init(Instant::now)
}

/// A timestamp: milliseconds since the clock was anchored
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The zero timestamp, used as "no event yet"
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

impl From<Timestamp> for u64 {
    fn from(tstamp: Timestamp) -> u64 {
        tstamp.0
    }
}

/// Current time on the monotonic clock.
///
/// Never returns [`Timestamp::ZERO`], so that a real event is always distinguishable
/// from the "nothing seen yet" baseline.
pub fn now() -> Timestamp {
    let millis = Instant::now().duration_since(startup_instant()).as_millis();
    let millis = u64::try_from(millis).unwrap_or(u64::MAX);
    Timestamp(millis.max(1))
}
