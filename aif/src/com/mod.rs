// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Channel based communication
//!
//! All data exchange between AIMs goes through the [MessageStore] of their workflow.
//! Producers [publish](MessageStore::publish) into named channels, consumers
//! [poll](MessageStore::poll) with a timeout and [copy](MessageStore::copy) the delivered value.

mod control;
mod message;
mod store;
mod subscriber;

pub use control::{RunState, TaskControl};
pub use message::{ChannelHandle, Delivery, Message, PollTimeout};
pub use store::{MessageStore, DEFAULT_CHANNEL_CAPACITY};
pub use subscriber::Subscriber;
