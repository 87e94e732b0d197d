// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! AI Modules: the units of computation and scheduling
//!
//! An [Aim] is built from its [AimBuilder] every time its record is started and
//! runs on a dedicated thread ([AimTask]). The [AimRecord] owns everything that
//! must survive a stop: name, input channels, subscriber identity and builder.

mod record;
mod task;

pub use record::AimRecord;
pub use task::AimTask;

use crate::com::{MessageStore, Subscriber};
use crate::error::Result;
use std::fmt::Display;

/// Lifecycle status of an AIM
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum AimStatus {
    Created,
    Alive,
    Paused,
    Stopped,
}

impl AimStatus {
    /// Whether a task exists for this status
    pub fn has_task(&self) -> bool {
        matches!(self, AimStatus::Alive | AimStatus::Paused)
    }
}

impl Display for AimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AimStatus::Created => "CREATED",
            AimStatus::Alive => "ALIVE",
            AimStatus::Paused => "PAUSED",
            AimStatus::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Aim trait, to be implemented by every AIM variant
pub trait Aim: Send {
    /// Called on the task thread before [`run`](Aim::run)
    fn startup(&mut self, _ctx: &Subscriber) -> Result<()> {
        Ok(())
    }

    /// The subscriber loop. Expected to block in polls of `ctx` and to return
    /// only with an error, [`Error::Cancelled`](crate::error::Error::Cancelled) on stop.
    fn run(&mut self, ctx: &Subscriber) -> Result<()>;

    /// Called on the task thread after [`run`](Aim::run) returned
    fn shutdown(&mut self) {}
}

/// Aim Builder trait.
///
/// Builds a fresh AIM instance on every start, resolving its channels in the
/// workflow's message store.
pub trait AimBuilder: Fn(&MessageStore) -> Result<Box<dyn Aim>> + Send + Sync {}

impl<T: Fn(&MessageStore) -> Result<Box<dyn Aim>> + Send + Sync> AimBuilder for T {}
