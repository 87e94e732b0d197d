// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! AIF is an execution framework for on-device analysis pipelines.
//! The name is an abbreviation of AI Framework.
//!
//! # AI Modules
//!
//! [AIMs](crate::aim::Aim) are the units of computation and scheduling. Each AIM runs on its
//! own thread, blocks in polls of its input channels and publishes derived results, e.g.
//! a motion event computed from accelerometer samples.
//!
//! # Communication via Channels
//!
//! AIMs communicate exclusively through the [message store](crate::com::MessageStore) of their
//! workflow. Channels hold the latest published value; every subscriber is notified once
//! per publish.
//!
//! # Workflows
//!
//! An AI workflow is a static wiring of channels and AIMs described by
//! [configuration](crate::config). The [controller](crate::controller::Controller) starts,
//! pauses, resumes and tears down workflows as a unit or AIM by AIM.

pub mod aim;
pub mod analysis;
pub mod com;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod supervisor;
pub mod timestamp;
pub mod workflow;

/// Re-export the public API
pub mod prelude {
    pub use crate::aim::{Aim, AimBuilder, AimStatus};
    pub use crate::com::{ChannelHandle, Delivery, Message, MessageStore, PollTimeout, Subscriber};
    pub use crate::controller::Controller;
    pub use crate::error::{Error, Result};
    pub use crate::ids::{AiwId, SubscriberId};
    pub use crate::supervisor::Supervisor;
    pub use crate::timestamp::Timestamp;
    pub use crate::{analysis, config};
}
