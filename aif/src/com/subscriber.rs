// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::control::TaskControl;
use super::message::{ChannelHandle, Delivery, Message, PollTimeout};
use super::store::MessageStore;
use crate::error::{Error, Result};
use crate::ids::SubscriberId;
use std::time::Duration;

/// A consumer's view of a message store.
///
/// Bundles the store with a subscriber id and, for AIM tasks, the task's control
/// so that every wait honors pause and stop. This is what an AIM task body receives.
#[derive(Debug, Clone)]
pub struct Subscriber {
    store: MessageStore,
    id: SubscriberId,
    control: Option<TaskControl>,
}

impl Subscriber {
    /// Create an uncontrolled subscriber, e.g. for an external consumer
    pub fn new(store: MessageStore, id: SubscriberId) -> Self {
        Self {
            store,
            id,
            control: None,
        }
    }

    /// Create a subscriber whose waits follow the given task control
    pub fn with_control(store: MessageStore, id: SubscriberId, control: TaskControl) -> Self {
        Self {
            store,
            id,
            control: Some(control),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Look up a channel of the store by name
    pub fn channel(&self, name: &str) -> Result<ChannelHandle> {
        self.store.channel(name)
    }

    pub fn poll(&self, timeout: impl Into<PollTimeout>, channel: ChannelHandle) -> Result<Delivery> {
        match &self.control {
            Some(control) => self
                .store
                .poll_with(self.id, timeout.into(), channel, control),
            None => self.store.poll(self.id, timeout.into(), channel),
        }
    }

    pub fn copy(&self, channel: ChannelHandle) -> Option<Message> {
        self.store.copy(self.id, channel)
    }

    /// Poll and copy in one step; a timeout is reported as [`Error::Timeout`]
    pub fn recv(&self, timeout: impl Into<PollTimeout>, channel: ChannelHandle) -> Result<Message> {
        match self.poll(timeout, channel)? {
            Delivery::Delivered => self
                .copy(channel)
                .ok_or(Error::Transport("delivered message vanished")),
            Delivery::TimedOut => Err(Error::Timeout),
        }
    }

    pub fn publish(&self, message: &Message, channel: ChannelHandle) -> Result<()> {
        self.store.publish(message, channel)
    }

    /// Scheduling point outside of a poll: parks while paused, fails when stopped
    pub fn checkpoint(&self) -> Result<()> {
        match &self.control {
            Some(control) => self.store.checkpoint(control),
            None => Ok(()),
        }
    }

    /// Sleep that ends early with [`Error::Cancelled`] when the task is stopped
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        match &self.control {
            Some(control) => self.store.sleep(duration, control),
            None => {
                std::thread::sleep(duration);
                Ok(())
            }
        }
    }
}
