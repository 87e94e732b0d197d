// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::control::{RunState, TaskControl};
use super::message::{ChannelHandle, Delivery, Message, PollTimeout};
use crate::error::{Error, Result};
use crate::ids::{AiwId, StoreId, SubscriberId};
use log::{debug, trace};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default size of the channel pool of a store
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Single slot of a channel: the latest value and its publish sequence number
struct ChannelSlot {
    name: String,
    seq: u64,
    latest: Option<Message>,
}

/// Per (subscriber, channel) delivery state
#[derive(Default)]
struct Cursor {
    /// Sequence number of the last publish delivered to this subscriber
    seq: u64,
    /// The message handed out by the last delivery
    delivered: Option<Message>,
}

#[derive(Default)]
struct StoreState {
    destroyed: bool,
    channels: Vec<ChannelSlot>,
    cursors: HashMap<(SubscriberId, usize), Cursor>,
}

/// Lock and condition variable shared by the store and all task controls bound to it
pub(crate) struct Shared {
    state: Mutex<StoreState>,
    cond: Condvar,
}

impl Shared {
    /// Apply `f` under the store lock and wake every waiter
    pub(crate) fn notify(&self, f: impl FnOnce()) {
        let _guard = self.state.lock();
        f();
        self.cond.notify_all();
    }
}

/// Remaining wait budget of a blocking call. Frozen while the caller is paused.
enum Budget {
    Forever,
    Until(Instant),
    Frozen(Duration),
}

impl Budget {
    fn new(timeout: PollTimeout) -> Self {
        match timeout {
            PollTimeout::Immediate => Budget::Until(Instant::now()),
            PollTimeout::After(duration) => Budget::after(duration),
            PollTimeout::Infinite => Budget::Forever,
        }
    }

    /// Deadlines beyond the range of `Instant` wait forever
    fn after(duration: Duration) -> Self {
        Instant::now()
            .checked_add(duration)
            .map_or(Budget::Forever, Budget::Until)
    }

    fn freeze(&mut self) {
        if let Budget::Until(deadline) = self {
            *self = Budget::Frozen(deadline.saturating_duration_since(Instant::now()));
        }
    }

    fn thaw(&mut self) {
        if let Budget::Frozen(remaining) = self {
            *self = Budget::after(*remaining);
        }
    }

    fn expired(&self) -> bool {
        matches!(self, Budget::Until(deadline) if Instant::now() >= *deadline)
    }
}

/// The publish/subscribe medium of one AI Workflow.
///
/// Channels are single-slot, latest-value-wins. Every subscriber has its own
/// delivery edge per channel: a poll reports [`Delivery::Delivered`] once per
/// publish it has not seen yet, independent of other subscribers. Publishes that
/// happen between two polls of the same subscriber are coalesced into one delivery
/// of the most recent value.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct MessageStore {
    id: StoreId,
    aiw_id: AiwId,
    name: Arc<str>,
    capacity: usize,
    shared: Arc<Shared>,
}

impl MessageStore {
    /// Create a store for the given workflow with a fixed-size channel pool
    pub fn new(aiw_id: AiwId, name: &str, capacity: usize) -> Self {
        debug!("Creating message store {name} for workflow {aiw_id} with {capacity} channels");
        Self {
            id: StoreId::next(),
            aiw_id,
            name: name.into(),
            capacity,
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::default()),
                cond: Condvar::new(),
            }),
        }
    }

    pub fn aiw_id(&self) -> AiwId {
        self.aiw_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    /// Allocate a new named channel from the pool
    pub fn create_channel(&self, name: &str) -> Result<ChannelHandle> {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return Err(Error::Transport("message store destroyed"));
        }
        if state.channels.iter().any(|c| c.name == name) {
            return Err(Error::Config(format!(
                "duplicate channel {name} in store {}",
                self.name
            )));
        }
        if state.channels.len() >= self.capacity {
            return Err(Error::ChannelExhausted {
                capacity: self.capacity,
            });
        }

        let index = state.channels.len();
        state.channels.push(ChannelSlot {
            name: name.to_owned(),
            seq: 0,
            latest: None,
        });
        debug!("Created channel {name} (C{index}) in store {}", self.name);
        Ok(ChannelHandle {
            store: self.id,
            index,
        })
    }

    /// Look up a channel by name
    pub fn channel(&self, name: &str) -> Result<ChannelHandle> {
        let state = self.shared.state.lock();
        state
            .channels
            .iter()
            .position(|c| c.name == name)
            .map(|index| ChannelHandle {
                store: self.id,
                index,
            })
            .ok_or_else(|| Error::NotFound(format!("channel {name}")))
    }

    /// Name of the given channel
    pub fn channel_name(&self, channel: ChannelHandle) -> Result<String> {
        let state = self.shared.state.lock();
        let index = self.index_of(&state, channel)?;
        Ok(state.channels[index].name.clone())
    }

    /// Write a message into the channel's slot and wake all pollers. Never blocks on consumers.
    pub fn publish(&self, message: &Message, channel: ChannelHandle) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return Err(Error::Transport("message store destroyed"));
        }
        let index = self.index_of(&state, channel)?;
        let slot = &mut state.channels[index];
        slot.seq += 1;
        slot.latest = Some(message.clone());
        trace!(
            "Published on {} (seq {}) at {}",
            slot.name,
            slot.seq,
            message.timestamp()
        );
        self.shared.cond.notify_all();
        Ok(())
    }

    /// Wait until a publish on `channel` not yet delivered to `subscriber` exists, or the timeout elapses.
    ///
    /// Fails with [`Error::Transport`] if the store is (or gets) destroyed.
    pub fn poll(
        &self,
        subscriber: SubscriberId,
        timeout: PollTimeout,
        channel: ChannelHandle,
    ) -> Result<Delivery> {
        self.poll_inner(subscriber, timeout, channel, None)
    }

    /// Like [`poll`](Self::poll), honoring the pause and cancellation state of `control`.
    ///
    /// While paused the wait is parked and its remaining time is frozen. Publishes
    /// that happen during the pause are delivered once after resume.
    pub fn poll_with(
        &self,
        subscriber: SubscriberId,
        timeout: PollTimeout,
        channel: ChannelHandle,
        control: &TaskControl,
    ) -> Result<Delivery> {
        self.poll_inner(subscriber, timeout, channel, Some(control))
    }

    fn poll_inner(
        &self,
        subscriber: SubscriberId,
        timeout: PollTimeout,
        channel: ChannelHandle,
        control: Option<&TaskControl>,
    ) -> Result<Delivery> {
        let mut state = self.shared.state.lock();
        let index = self.index_of(&state, channel)?;
        let mut budget = Budget::new(timeout);

        loop {
            if !self.admit(&mut state, control, &mut budget)? {
                continue;
            }

            let StoreState {
                channels, cursors, ..
            } = &mut *state;
            let slot = &channels[index];
            let cursor = cursors.entry((subscriber, index)).or_default();
            if slot.seq > cursor.seq {
                cursor.seq = slot.seq;
                cursor.delivered = slot.latest.clone();
                return Ok(Delivery::Delivered);
            }

            if budget.expired() {
                return Ok(Delivery::TimedOut);
            }
            self.block(&mut state, &budget);
        }
    }

    /// Return the message delivered by the last successful poll of `subscriber` on `channel`.
    ///
    /// Only meaningful right after [`Delivery::Delivered`]; otherwise returns the previous
    /// delivery or `None`.
    pub fn copy(&self, subscriber: SubscriberId, channel: ChannelHandle) -> Option<Message> {
        let state = self.shared.state.lock();
        let index = self.index_of(&state, channel).ok()?;
        state
            .cursors
            .get(&(subscriber, index))
            .and_then(|c| c.delivered.clone())
    }

    /// Block while `control` is paused; fail if it is cancelled or the store is destroyed
    pub fn checkpoint(&self, control: &TaskControl) -> Result<()> {
        let mut state = self.shared.state.lock();
        let mut budget = Budget::Forever;
        while !self.admit(&mut state, Some(control), &mut budget)? {}
        Ok(())
    }

    /// Sleep for `duration` unless cancelled. Time spent paused does not count.
    pub fn sleep(&self, duration: Duration, control: &TaskControl) -> Result<()> {
        let mut state = self.shared.state.lock();
        let mut budget = Budget::new(duration.into());
        loop {
            if !self.admit(&mut state, Some(control), &mut budget)? {
                continue;
            }
            if budget.expired() {
                return Ok(());
            }
            self.block(&mut state, &budget);
        }
    }

    /// Destroy the store: drop all values and fail every pending and future wait
    pub fn destroy(&self) {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return;
        }
        debug!("Destroying message store {}", self.name);
        state.destroyed = true;
        state.channels.iter_mut().for_each(|c| c.latest = None);
        state.cursors.clear();
        self.shared.cond.notify_all();
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.lock().destroyed
    }

    /// Check store and task state before a wait round.
    ///
    /// Returns `Ok(false)` after having parked for a pause; the caller must re-check.
    fn admit(
        &self,
        state: &mut MutexGuard<'_, StoreState>,
        control: Option<&TaskControl>,
        budget: &mut Budget,
    ) -> Result<bool> {
        if state.destroyed {
            return Err(Error::Transport("message store destroyed"));
        }
        match control.map(TaskControl::run_state) {
            Some(RunState::Cancelled) => Err(Error::Cancelled),
            Some(RunState::Paused) => {
                budget.freeze();
                self.shared.cond.wait(state);
                Ok(false)
            }
            _ => {
                budget.thaw();
                Ok(true)
            }
        }
    }

    fn block(&self, state: &mut MutexGuard<'_, StoreState>, budget: &Budget) {
        match budget {
            Budget::Until(deadline) => {
                let _ = self.shared.cond.wait_until(state, *deadline);
            }
            _ => self.shared.cond.wait(state),
        }
    }

    fn index_of(&self, state: &StoreState, channel: ChannelHandle) -> Result<usize> {
        if channel.store != self.id {
            return Err(Error::Transport("channel handle of another message store"));
        }
        if channel.index >= state.channels.len() {
            return Err(Error::NotFound(format!("channel {channel}")));
        }
        Ok(channel.index)
    }
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore")
            .field("name", &self.name)
            .field("aiw_id", &self.aiw_id)
            .field("capacity", &self.capacity)
            .finish()
    }
}
