// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use crate::ids::StoreId;
use crate::timestamp::{self, Timestamp};
use std::any::Any;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// A published value: an opaque payload stamped with its publish time.
///
/// Messages are immutable. Cloning shares the payload.
#[derive(Clone)]
pub struct Message {
    timestamp: Timestamp,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self::at(timestamp::now(), payload)
    }

    /// Create a message with an explicit timestamp
    pub fn at<T: Any + Send + Sync>(timestamp: Timestamp, payload: T) -> Self {
        Self {
            timestamp,
            payload: Arc::new(payload),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Get the payload if it is of type `T`
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Opaque handle of a channel.
///
/// Only valid for the store that created it; stable for that store's lifetime.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ChannelHandle {
    pub(crate) store: StoreId,
    pub(crate) index: usize,
}

impl Display for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.index)
    }
}

/// How long a poll may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTimeout {
    /// Check once and return
    Immediate,
    /// Block at most this long
    After(Duration),
    /// Block until data arrives or the store is destroyed
    Infinite,
}

impl PollTimeout {
    pub fn from_millis(millis: u64) -> Self {
        Duration::from_millis(millis).into()
    }
}

impl From<Duration> for PollTimeout {
    fn from(value: Duration) -> Self {
        if value.is_zero() {
            PollTimeout::Immediate
        } else {
            PollTimeout::After(value)
        }
    }
}

/// Outcome of a successful poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A new message is available through `copy`
    Delivered,
    /// The deadline elapsed without a new message
    TimedOut,
}
