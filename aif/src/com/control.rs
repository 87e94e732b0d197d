// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::store::{MessageStore, Shared};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const RUNNING: u8 = 0;
const PAUSED: u8 = 1;
const CANCELLED: u8 = 2;

/// Run state of a task as seen by its waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Cancelled,
}

/// Pause flag and cancellation token shared between an AIM record and its task.
///
/// The task observes the control at every wait inside the message store. State
/// changes are made under the store lock and wake all waiters, so a task blocked
/// in a poll parks (pause) or returns [`Error::Cancelled`](crate::error::Error::Cancelled)
/// without losing its wait.
#[derive(Clone)]
pub struct TaskControl {
    state: Arc<AtomicU8>,
    shared: Arc<Shared>,
}

impl TaskControl {
    /// Create a running control bound to the waits of `store`
    pub fn new(store: &MessageStore) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
            shared: store.shared(),
        }
    }

    pub fn run_state(&self) -> RunState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => RunState::Running,
            PAUSED => RunState::Paused,
            _ => RunState::Cancelled,
        }
    }

    pub fn pause(&self) {
        self.transition(RUNNING, PAUSED);
    }

    pub fn resume(&self) {
        self.transition(PAUSED, RUNNING);
    }

    /// Cancel the task. Terminal: a cancelled control never runs again.
    pub fn cancel(&self) {
        self.shared.notify(|| self.state.store(CANCELLED, Ordering::Release));
    }

    pub fn is_cancelled(&self) -> bool {
        self.run_state() == RunState::Cancelled
    }

    fn transition(&self, from: u8, to: u8) {
        self.shared.notify(|| {
            let _ = self
                .state
                .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire);
        });
    }
}

impl std::fmt::Debug for TaskControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TaskControl").field(&self.run_state()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AiwId;

    #[test]
    fn transitions() {
        let store = MessageStore::new(AiwId::new(0, 0), "test", 1);
        let control = TaskControl::new(&store);
        assert_eq!(control.run_state(), RunState::Running);

        // resume without pause is a no-op
        control.resume();
        assert_eq!(control.run_state(), RunState::Running);

        control.pause();
        assert_eq!(control.run_state(), RunState::Paused);
        control.resume();
        assert_eq!(control.run_state(), RunState::Running);

        control.pause();
        control.cancel();
        assert!(control.is_cancelled());

        // cancellation is terminal
        control.resume();
        control.pause();
        assert!(control.is_cancelled());
    }
}
