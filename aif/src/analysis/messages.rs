// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Messages
//!
//! Payload records exchanged by the analysis AIMs. The store treats them as
//! opaque; producers and consumers agree on the type per channel.

use crate::timestamp::Timestamp;

/// Raw accelerometer sample published by the sensor driver
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    /// Acceleration along x, y and z in m/s²
    pub accel: [f32; 3],
}

impl SensorReading {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { accel: [x, y, z] }
    }

    /// Magnitude of the acceleration vector
    pub fn total_acceleration(&self) -> f32 {
        self.accel.iter().map(|a| a * a).sum::<f32>().sqrt()
    }
}

/// Tag of a motion event
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub enum MotionKind {
    #[default]
    Unknown,
    Stopped,
    Started,
}

/// Motion event published by the motion recognition AIM
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    pub kind: MotionKind,
    pub accel_total: f32,
}

/// Audio peak detected by the volume analysis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioPeak {
    pub level: f32,
}

/// Why a correlation failed
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum FailureReason {
    /// No primary event arrived within the primary window
    NoPrimaryEvent,
    /// A primary event was not confirmed within the confirmation window
    NoConfirmation,
}

/// Result of one correlation window
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Correlation {
    Succeeded {
        primary: Timestamp,
        confirmation: Timestamp,
    },
    Failed(FailureReason),
}

impl Correlation {
    pub fn is_success(&self) -> bool {
        matches!(self, Correlation::Succeeded { .. })
    }
}

/// Correlation result published by the validation AIM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict(pub Correlation);
