// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! AIF Error implementation

use crate::aim::AimStatus;

/// AIF Error type
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Start requested for an AIM or workflow that is already running
    AlreadyRunning(String),
    /// Unknown workflow, AIM or channel
    NotFound(String),
    /// A receive deadline elapsed without a delivery
    Timeout,
    /// The wait primitive failed, e.g. the message store was destroyed mid-wait
    Transport(&'static str),
    /// The channel pool of a message store is full
    ChannelExhausted { capacity: usize },
    /// Lifecycle operation not permitted from the current status
    InvalidState {
        name: String,
        status: AimStatus,
        operation: &'static str,
    },
    /// The task was stopped while waiting
    Cancelled,
    /// Invalid configuration
    Config(String),
    Io((std::io::Error, &'static str)),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io((e, _)) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::AlreadyRunning(name) => write!(f, "{name} is already running"),
            Error::NotFound(name) => write!(f, "{name} not found"),
            Error::Timeout => write!(f, "timed out"),
            Error::Transport(description) => write!(f, "Transport error, {description}"),
            Error::ChannelExhausted { capacity } => {
                write!(f, "channel pool exhausted (capacity {capacity})")
            }
            Error::InvalidState {
                name,
                status,
                operation,
            } => write!(f, "cannot {operation} {name} in state {status}"),
            Error::Cancelled => write!(f, "cancelled"),
            Error::Config(description) => write!(f, "Configuration error: {description}"),
            Error::Io((e, description)) => write!(f, "Io error: {description}, {e}"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
